use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    components::{
        layout::{Card, Page},
        profile::ProfileCard,
    },
    errors::{ServerResult, WithRedirect as _},
    routes::home,
    session::UserSession,
    state::AppState,
};

/// Profile page. Calls Microsoft Graph with the session's access token.
pub async fn profile(
    State(state): State<AppState>,
    session: UserSession,
) -> ServerResult<Response, axum::response::Redirect> {
    let Some(token_set) = session.data().token_set.as_ref() else {
        info!("Session {} has no token set, redirecting home", session.id());
        return Ok(home().into_response());
    };

    let profile = state
        .entra
        .fetch_profile(&token_set.access_token)
        .await
        .with_redirect(home())?;

    let card = Card::new(ProfileCard::new(profile)).with_max_width("max-w-2xl");

    Ok(Page::new("Profile", card).into_response())
}
