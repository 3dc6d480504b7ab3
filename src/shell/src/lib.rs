pub mod cli;
pub mod config;
pub mod http_client;
pub mod kernel_host;
pub mod screen;
pub mod shell;
pub mod storage;
