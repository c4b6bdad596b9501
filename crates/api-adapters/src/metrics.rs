//! # Forum metrics
//!
//! Prometheus counters for the write paths, exposed at `/metrics`.

use std::fmt;

use domains::{VoteTarget, VoteType};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct VoteLabels {
    target: String,
    direction: String,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
struct PostLabels {
    kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Question,
    Answer,
}

impl PostKind {
    fn as_str(self) -> &'static str {
        match self {
            PostKind::Question => "question",
            PostKind::Answer => "answer",
        }
    }
}

pub struct Metrics {
    registry: Registry,
    votes: Family<VoteLabels, Counter>,
    answers_accepted: Counter,
    posts_created: Family<PostLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("stackit");
        let votes = Family::<VoteLabels, Counter>::default();
        let answers_accepted = Counter::default();
        let posts_created = Family::<PostLabels, Counter>::default();

        registry.register("votes", "Votes applied to questions and answers", votes.clone());
        registry.register(
            "answers_accepted",
            "Answers marked as accepted",
            answers_accepted.clone(),
        );
        registry.register(
            "posts_created",
            "Questions and answers created",
            posts_created.clone(),
        );

        Self {
            registry,
            votes,
            answers_accepted,
            posts_created,
        }
    }

    pub fn record_vote(&self, target: VoteTarget, vote: VoteType) {
        self.votes
            .get_or_create(&VoteLabels {
                target: target.as_str().to_string(),
                direction: vote.as_str().to_string(),
            })
            .inc();
    }

    pub fn record_acceptance(&self) {
        self.answers_accepted.inc();
    }

    pub fn record_post(&self, kind: PostKind) {
        self.posts_created
            .get_or_create(&PostLabels {
                kind: kind.as_str().to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
