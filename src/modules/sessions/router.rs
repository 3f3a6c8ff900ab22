use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller;

/// Routes for credential issuance and the stateless token path.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(controller::login))
        .route("/refresh", post(controller::refresh))
        .route("/logout", post(controller::logout))
        .route("/change-password", post(controller::change_password))
        .route("/me", get(controller::me))
}

/// Routes for the stateful control-panel surface.
pub fn init_panel_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(controller::panel_me))
        .route("/sessions", get(controller::list_sessions))
        .route("/sessions/revoke-all", post(controller::revoke_all))
}
