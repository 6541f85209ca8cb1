pub mod protocol;
pub mod router;
pub mod server;

/// Process-unique identifier of one client connection.
pub type ConnId = u64;
