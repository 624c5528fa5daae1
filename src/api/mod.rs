/// API routes and handlers
pub mod auth;
pub mod courses;
pub mod middleware;
pub mod registrations;
pub mod students;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(students::routes())
        .merge(courses::routes())
        .merge(registrations::routes())
}
