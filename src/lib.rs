pub mod config;
pub mod errors;
pub mod net;
pub mod output;
pub mod server;
pub mod storage;
