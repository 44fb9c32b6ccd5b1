use entra_pkce::{
    cron, routes,
    server::run_server,
    setup::{setup_sentry, setup_tracing},
    state::AppState,
};
use tracing::info;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // A local .env file is optional; real environment variables win
    let _ = dotenvy::dotenv();

    // Initialize Sentry for error tracking
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { run_application().await })
}

async fn run_application() -> entra_pkce::Result<()> {
    setup_tracing("entra-pkce")?;

    let app_state = AppState::from_env()?;
    let port = app_state.config.port;

    info!("Spawning application tasks");
    let server = tokio::spawn(run_server(routes::routes(app_state.clone()), port));
    let sweeper = tokio::spawn(cron::run_cron(app_state));

    // The sweeper never finishes on its own, so the server ending ends the process
    tokio::select! {
        result = server => result??,
        result = sweeper => result??,
    }

    Ok(())
}
