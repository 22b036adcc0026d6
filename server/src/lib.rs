pub mod action;
pub mod campaign;
pub mod config;
pub mod messenger;
pub mod money;
pub mod notify;
pub mod progress;
pub mod router;
pub mod services;
pub mod session;
pub mod telegram;
pub mod transport;
