pub mod admin;
pub mod backoff;
pub mod client;
pub mod config;
pub mod gate;
pub mod poller;
