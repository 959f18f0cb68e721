pub mod config;
pub mod core;
#[cfg(feature = "remote-inference")]
pub mod http_client;
