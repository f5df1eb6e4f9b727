pub mod api;
pub mod config;
pub mod flags;
pub mod guests;
pub mod kv;
pub mod metrics_utils;
pub mod router;
pub mod server;

// Shared with the integration tests under tests/, so it is compiled into the
// library rather than behind cfg(test).
pub mod test_utils;
