//! HTTP route definitions.
//!
//! All domain endpoints live under `/api`; the health check sits at the
//! root.

use axum::Router;

use crate::state::AppState;

pub mod conversations;
pub mod events;
pub mod health;
pub mod notifications;
pub mod offers;
pub mod reviews;

/// Build the complete application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(offers::routes())
        .merge(conversations::routes())
        .merge(notifications::routes())
        .merge(reviews::routes())
        .merge(events::routes());

    Router::new()
        .merge(health::routes())
        .nest("/api", api)
        .with_state(state)
}
