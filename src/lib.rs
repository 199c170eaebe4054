pub mod config;
pub mod constants;
pub mod core_acl;
pub mod core_cli;
pub mod core_control;
pub mod core_db;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod core_tls;
pub mod core_transfer;
pub mod core_vfs;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
