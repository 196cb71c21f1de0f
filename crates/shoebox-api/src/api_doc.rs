//! OpenAPI documentation, served at `/api-docs/openapi.json`

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use shoebox_core::models;
use shoebox_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shoebox Coordinator API",
        version = "0.1.0",
        description = "Deduplicating upload coordinator. Clients describe a file by content digest, name and capture time; the coordinator answers with skip or a short-lived write capability for the object store."
    ),
    paths(
        handlers::upload_request::request_upload,
        handlers::health::health,
    ),
    components(
        schemas(
            models::FileMetadata,
            models::UploadDecision,
            models::Capability,
            ErrorResponse,
            handlers::health::HealthResponse,
        )
    ),
    modifiers(&BasicAuthAddon),
    tags(
        (name = "uploads", description = "Upload coordination"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct BasicAuthAddon;

impl Modify for BasicAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
