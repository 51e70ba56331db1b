use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use crate::common::response::ApiResponse;
use crate::docs::ApiDoc;
use axum::{Json, Router};
use crate::state::AppState;

use tower_http::cors::{Any, CorsLayer};

pub fn configure_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api_routes())
        .nest("/api/v1", crate::modules::jobs::router())
        .layer(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/health",
        axum::routing::get(|| async { Json(ApiResponse::success("ok", "Service is healthy")) }),
    )
}
