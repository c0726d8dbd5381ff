use axum::{Router, routing::get};

pub mod admin;
pub mod advertisements;
pub mod auth;
pub mod common;
pub mod hosts;
pub mod listings;
pub mod map;
pub mod properties;
pub mod rbac;
pub mod reservations;
pub mod reviews;
pub mod system;

/// Every endpoint behind the auth middleware.
///
/// The middleware only attaches a principal when a bearer token is present;
/// handlers decide whether one is required.
pub fn router() -> Router {
    let api = Router::new()
        .merge(auth::legacy_router())
        .merge(rbac::router())
        .nest("/admin/users", admin::router())
        .nest("/listings", listings::router())
        .nest("/advertisements", advertisements::router())
        .nest("/categories", advertisements::categories_router())
        .nest("/hosts", hosts::router())
        .merge(hosts::records_router())
        .nest("/locations", map::router())
        .merge(map::items_router())
        .nest("/reservations", reservations::router())
        .nest("/special-offers", reservations::offers_router())
        .nest("/availability-blocks", reservations::blocks_router())
        .nest("/reviews", reviews::router())
        .nest("/properties", properties::router());

    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/api", api)
}
