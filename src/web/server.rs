use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::view as view_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;
use super::ui::handlers as ui_handlers;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let auto_refresh = config.live.auto_refresh;

    let state = AppState::from_config(config).map_err(std::io::Error::other)?;

    state.view.load_vehicles().await;
    let report = state.view.refresh_all(true).await;
    log::info!(
        "Initial refresh: latest {:?}, tracks {:?}",
        report.latest,
        report.tracks
    );

    if auto_refresh {
        state.poller.lock().await.set_enabled(true, &state.view);
    }

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI
        .route("/", get(ui_handlers::dashboard))
        // View API
        .route("/api/view/vehicles", get(view_handlers::vehicles))
        .route("/api/view/scene", get(view_handlers::scene))
        .route("/api/view/table", get(view_handlers::table))
        .route("/api/view/status", get(view_handlers::status))
        .route("/api/view/selection", put(view_handlers::select))
        .route("/api/view/refresh", post(view_handlers::refresh))
        .route("/api/view/fit", post(view_handlers::fit))
        .route(
            "/api/view/auto-refresh",
            put(view_handlers::set_auto_refresh),
        )
        .route("/api/view/viewport", put(view_handlers::set_viewport))
        .route("/api/view/panel", put(view_handlers::set_panel))
        .route(
            "/api/view/panel/toggle",
            post(view_handlers::toggle_panel),
        )
        .route(
            "/api/view/rows/{vehicle_id}/{index}/activate",
            post(view_handlers::activate_row),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
