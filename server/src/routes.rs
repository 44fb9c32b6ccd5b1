use axum::{extract::Request, response::Redirect, routing::get};
use maud::html;
use tower_cookies::CookieManagerLayer;
use tracing::error;

use crate::{
    components::{
        layout::{Card, Page},
        ui::{button::Button, heading::Heading},
    },
    session::UserSession,
    state::AppState,
};

pub mod entra;

/// Where every failed or abandoned step of the flow ends up
pub(crate) fn home() -> Redirect {
    Redirect::to("/")
}

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(root_page))
        .route("/logout", get(logout))
        // Entra ID OAuth routes
        .route("/auth", get(entra::authorize))
        .route("/auth/callback", get(entra::callback))
        .route("/profile", get(entra::profile))
        .layer(CookieManagerLayer::new())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(sentry_tower::SentryHttpLayer::with_transaction())
        .layer(sentry_tower::NewSentryLayer::<Request>::new_from_top())
        .with_state(app_state)
}

/// Root page handler - links to the start of the flow
async fn root_page() -> Page {
    let content = html! {
        div class="text-center" {
            (Heading::h1("Microsoft Entra ID PKCE demo"))
            p class="text-gray-600 mb-6" {
                "Sign in with the authorization code flow and view your Microsoft Graph profile."
            }
            (Button::primary("Login with Microsoft Entra ID", "/auth").full_width(true))
        }
    };

    Page::new("Login", Card::new(content))
}

/// Destroy the session and go home, whether or not the store cooperated
async fn logout(session: UserSession) -> Redirect {
    let session_id = session.id();
    if let Err(err) = session.destroy().await {
        error!("Failed to destroy session {}: {:?}", session_id, err);
    }

    home()
}
