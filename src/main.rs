use user_accounts::{app, db, state::AppState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("user_accounts=debug,axum=info,tower_http=info");

    let app_state = AppState::init().await?;

    {
        let mut conn = app_state.db.acquire().await?;
        db::bootstrap(&mut conn).await?;
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
