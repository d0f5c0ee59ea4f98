pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod router;
pub mod state;
