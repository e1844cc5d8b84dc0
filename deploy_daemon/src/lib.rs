pub mod cli;
pub mod client_handler;
pub mod container;
pub mod daemon;
pub mod fabric;
pub mod managers;
pub mod socket;
pub mod storage;
pub mod utils;
pub mod virtualization;
