//! # api-adapters
//!
//! The HTTP surface for StackIt. With `web-axum` this crate builds the
//! axum router: JSON handlers under `/api`, the auth extractor, error
//! mapping, and the tower-http middleware stack. Metrics are always built.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;

#[cfg(feature = "web-axum")]
pub use app::{router, AppState};
pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
mod app {
    use std::sync::Arc;

    use axum::routing::{get, post, put};
    use axum::Router;
    use services::Services;

    use crate::handlers::{answers, auth, notifications, questions, system};
    use crate::metrics::Metrics;

    /// State shared by every handler.
    #[derive(Clone)]
    pub struct AppState {
        pub services: Services,
        pub metrics: Arc<Metrics>,
    }

    impl AppState {
        pub fn new(services: Services) -> Self {
            Self {
                services,
                metrics: Arc::new(Metrics::new()),
            }
        }
    }

    pub fn router(state: AppState) -> Router {
        let api = Router::new()
            .route("/auth/register", post(auth::register))
            .route("/auth/login", post(auth::login))
            .route("/auth/me", get(auth::me))
            .route("/questions", get(questions::list).post(questions::create))
            .route(
                "/questions/{id}",
                get(questions::show)
                    .put(questions::update)
                    .delete(questions::delete),
            )
            .route("/questions/{id}/vote", put(questions::vote))
            .route(
                "/questions/{id}/answers",
                get(answers::list).post(answers::create),
            )
            .route("/answers/{id}", put(answers::update).delete(answers::delete))
            .route("/answers/{id}/vote", put(answers::vote))
            .route("/answers/{id}/accept", put(answers::accept))
            .route("/notifications", get(notifications::list))
            .route("/notifications/unread-count", get(notifications::unread_count))
            .route("/notifications/read-all", put(notifications::read_all))
            .route("/notifications/{id}/read", put(notifications::mark_read));

        let app = Router::new()
            .route("/", get(system::welcome))
            .route("/metrics", get(system::metrics))
            .nest("/api", api)
            .fallback(system::not_found)
            .with_state(state);

        crate::middleware::apply(app)
    }
}
