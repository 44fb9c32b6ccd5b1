pub mod layout;
pub mod profile;
pub mod ui;
