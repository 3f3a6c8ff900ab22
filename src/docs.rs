use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::sessions::controller::{ErrorResponse, MeResponse};
use crate::modules::sessions::model::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RevokeAllRequest,
    RevokeAllResponse, SessionSummary,
};
use crate::modules::users::model::PublicUser;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::sessions::controller::login,
        crate::modules::sessions::controller::refresh,
        crate::modules::sessions::controller::logout,
        crate::modules::sessions::controller::me,
        crate::modules::sessions::controller::change_password,
        crate::modules::sessions::controller::panel_me,
        crate::modules::sessions::controller::list_sessions,
        crate::modules::sessions::controller::revoke_all,
    ),
    components(
        schemas(
            PublicUser,
            LoginRequest,
            LoginResponse,
            ChangePasswordRequest,
            RevokeAllRequest,
            RevokeAllResponse,
            MessageResponse,
            SessionSummary,
            MeResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Sessions", description = "Credential issuance, rotation, and revocation"),
        (name = "Panel", description = "Stateful control-panel session surface")
    ),
    info(
        title = "Rollcall API",
        version = "0.1.0",
        description = "Session and credential lifecycle service for the Rollcall school administration backend.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
