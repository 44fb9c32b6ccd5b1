pub mod components;
pub mod config;
pub mod cookies;
pub mod cron;
pub mod errors;
pub mod oauth;
pub mod pkce;
pub mod routes;
pub mod server;
pub mod session;
pub mod setup;
pub mod state;

pub type Result<T, E = color_eyre::Report> = std::result::Result<T, E>;
