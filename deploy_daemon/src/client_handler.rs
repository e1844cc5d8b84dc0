pub mod client_command_handler;
pub mod client_helper;
