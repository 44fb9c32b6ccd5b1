//! Microsoft Entra ID OAuth routes
//! The three steps of the authorization code flow: send the browser to the
//! provider, redeem the code it comes back with, and use the token.

mod auth;
mod callback;
mod profile;

pub use auth::*;
pub use callback::*;
pub use profile::*;
