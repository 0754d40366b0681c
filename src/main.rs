use roteiro::{
    auth::{AuthSession, Route},
    config::AppConfig,
    error::{Action, AppError},
    state::AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    info!(api_url = %config.api_url, storage = ?config.storage, "starting");

    let state = AppState::from_config(config).await?;
    let session = AuthSession::load(state.storage.clone()).await;

    let Some(route) = session.route() else {
        return Ok(());
    };
    info!(%route, email = ?session.email(), "initial route");

    if route == Route::Main {
        match state.api.me().await {
            Ok(user) => info!("signed in as {}", user.short_name()),
            Err(err) => {
                let alert = err.alert_for(Action::General);
                warn!(title = %alert.title, "{}", alert.message);
            }
        }
        let trips = state.trips.find_all(None).await;
        info!(count = trips.len(), "local trips");
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,roteiro=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
