pub mod cards;
pub mod config;
pub mod engine;
pub mod net;
pub mod room;
pub mod tokio_tools;

pub use config::TableConfig;
pub use net::server::{run_server, ServerConfig};
