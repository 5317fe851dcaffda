pub mod http_client;
pub mod transport;
