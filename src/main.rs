use pharmacy_inventory::{
    app::{build_app, serve},
    logging,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("pharmacy_inventory=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;
    let config = app_state.config.clone();

    let app = build_app(app_state);
    serve(app, &config).await
}
