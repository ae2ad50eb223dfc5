use bazaar_auth_api::{config, routes, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up JWT_SECRET, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting Bazaar auth API in {:?} mode", config.environment);

    // A missing signing secret is a configuration error; refuse to serve.
    let state = AppState::from_config(config)
        .expect("JWT_SECRET must be set before the auth service can start");

    let app = routes::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("BAZAAR_AUTH_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("auth service listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
