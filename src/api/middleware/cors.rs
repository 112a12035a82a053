use http::Method;
use http::header::CONTENT_TYPE;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// The UI is served from a separate origin behind the gateway, so the API
/// answers with a wildcard origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(AllowOrigin::any())
}
