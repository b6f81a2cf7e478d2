use axum::{
    routing::{get, post},
    Router,
};
use quizlab_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth::require_bearer_auth,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    if config.generation_api_key.is_none() {
        tracing::warn!(
            "GENERATION_API_KEY is not set; question variations will fall back to source copies"
        );
    }

    let app_state = AppState::new(pool);

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/tests/:id", get(routes::tests::get_test))
        .route("/test-results", post(routes::results::create_result));

    let protected_api = Router::new()
        .route("/protected", get(routes::auth::protected))
        .route(
            "/tests",
            get(routes::tests::list_tests).post(routes::tests::create_test),
        )
        .route("/tests/:id", axum::routing::delete(routes::tests::delete_test))
        .route(
            "/tests/:id/generate-variation",
            post(routes::tests::generate_variation),
        )
        .route("/questions", post(routes::questions::create_question))
        .route(
            "/test-results/test/:id",
            get(routes::results::list_results_for_test),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    let app = public_api
        .merge(protected_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
