

pub mod server;

pub use server::{run_server, PartscoutMcpServer};
