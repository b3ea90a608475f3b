mod config;
mod error;
mod evaluation;
mod routes;
mod state;

use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env();

    let db = PgPool::connect(&config.database_url)
        .await
        .expect("Error connecting DB");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("Error running migrations");

    let state = state::AppState { db };

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .expect("Error binding listener");

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await.expect("Server error");
}
