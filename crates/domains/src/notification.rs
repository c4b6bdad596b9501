//! Notification composition: who gets told what, and never about themselves.

use chrono::Utc;

use crate::models::{Answer, Notification, NotificationId, NotificationKind, Question, User, UserId};

const TITLE_PREVIEW_CHARS: usize = 30;

impl Notification {
    /// Builds an unread notification, or `None` when `sender` would notify themselves.
    pub fn compose(
        kind: NotificationKind,
        sender: &User,
        recipient: UserId,
        question: &Question,
        answer: &Answer,
    ) -> Option<Self> {
        if sender.id == recipient {
            return None;
        }

        let title = title_preview(&question.title);
        let message = match kind {
            NotificationKind::Answer => {
                format!("{} answered your question: \"{title}\"", sender.username)
            }
            NotificationKind::Accept => {
                format!("{} accepted your answer on: \"{title}\"", sender.username)
            }
        };

        Some(Self {
            id: NotificationId::generate(),
            recipient,
            sender: sender.id,
            kind,
            question: Some(question.id),
            answer: Some(answer.id),
            message,
            read: false,
            created_at: Utc::now(),
        })
    }
}

fn title_preview(title: &str) -> String {
    let mut chars = title.chars();
    let head: String = chars.by_ref().take(TITLE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionDraft, Role};

    fn user(name: &str) -> User {
        User {
            id: UserId::generate(),
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: String::new(),
            avatar: String::new(),
            role: Role::User,
            reputation: 0,
            created_at: Utc::now(),
        }
    }

    fn question(owner: &User, title: &str) -> Question {
        let draft = QuestionDraft {
            title: title.into(),
            description: "desc".into(),
            tags: vec![],
        };
        Question::new(draft, owner.id).unwrap()
    }

    #[test]
    fn answer_message_names_the_sender() {
        let asker = user("alice");
        let helper = user("bob");
        let q = question(&asker, "Short title");
        let a = Answer::new("reply".into(), helper.id, q.id).unwrap();

        let n = Notification::compose(NotificationKind::Answer, &helper, asker.id, &q, &a).unwrap();
        assert_eq!(n.message, "bob answered your question: \"Short title\"");
        assert_eq!(n.recipient, asker.id);
        assert_eq!(n.sender, helper.id);
        assert!(!n.read);
    }

    #[test]
    fn long_titles_are_truncated_to_thirty_chars() {
        let asker = user("alice");
        let q = question(&asker, "How do I share state between many async tasks?");
        let a = Answer::new("use Arc".into(), asker.id, q.id).unwrap();

        let n = Notification::compose(NotificationKind::Accept, &asker, UserId::generate(), &q, &a)
            .unwrap();
        assert_eq!(
            n.message,
            "alice accepted your answer on: \"How do I share state between m...\""
        );
    }

    #[test]
    fn exactly_thirty_chars_gets_no_ellipsis() {
        assert_eq!(title_preview(&"x".repeat(30)), "x".repeat(30));
        assert_eq!(title_preview("ünïcödé"), "ünïcödé");
    }

    #[test]
    fn self_actions_never_notify() {
        let asker = user("alice");
        let q = question(&asker, "Mine");
        let a = Answer::new("also mine".into(), asker.id, q.id).unwrap();

        assert!(Notification::compose(NotificationKind::Answer, &asker, asker.id, &q, &a).is_none());
    }
}
