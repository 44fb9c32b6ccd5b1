use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Redirect,
};
use color_eyre::eyre::eyre;
use serde::Deserialize;
use tracing::info;

use crate::{
    errors::{ServerError, ServerResult, WithRedirect as _},
    routes::home,
    session::UserSession,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// The redirect URI: trade the authorization code for a token set.
///
/// Any failure sends the browser home; what went wrong is only logged.
pub async fn callback(
    State(state): State<AppState>,
    mut session: UserSession,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ServerResult<Redirect, Redirect> {
    let Query(params) = params
        .map_err(|rejection| ServerError(eyre!("Unreadable callback query: {}", rejection), home()))?;

    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "No error description provided".to_string());
        return Err(ServerError(
            eyre!("OAuth error from provider: {} - {}", error, description),
            home(),
        ));
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return Err(ServerError(eyre!("No code parameter in callback"), home()));
    };

    let Some(code_verifier) = session.data().code_verifier.clone() else {
        return Err(ServerError(
            eyre!("Session {} has no code verifier to redeem a code with", session.id()),
            home(),
        ));
    };

    let token_set = state
        .entra
        .exchange_code_for_token(&code, &code_verifier)
        .await
        .with_redirect(home())?;

    info!(
        token_type = ?token_set.token_type(),
        expires_in = ?token_set.expires_in(),
        "Token exchange succeeded for session {}",
        session.id()
    );

    session
        .set_token_set(token_set)
        .await
        .with_redirect(home())?;

    Ok(Redirect::to("/profile"))
}
