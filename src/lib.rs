pub mod app;
pub mod auth;
pub mod check;
pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod migrations;
pub mod state;
