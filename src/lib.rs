pub mod api;
pub mod config;
pub mod query;
pub mod server;
pub mod upstream;
