use axum::{extract::State, response::Redirect};
use tracing::info;

use crate::{
    errors::{ServerResult, WithRedirect as _},
    pkce::PkcePair,
    routes::home,
    session::UserSession,
    state::AppState,
};

/// Start the Entra ID OAuth flow.
///
/// Every hit generates a new verifier, so an older attempt still in flight in
/// this session can no longer be completed.
pub async fn authorize(
    State(state): State<AppState>,
    mut session: UserSession,
) -> ServerResult<Redirect, Redirect> {
    let pkce = PkcePair::generate();

    let url = state
        .entra
        .authorize_url(&pkce.challenge)
        .with_redirect(home())?;

    session
        .set_code_verifier(pkce.verifier)
        .await
        .with_redirect(home())?;

    info!("Session {} sent to the authorize endpoint", session.id());
    Ok(Redirect::to(&url))
}
