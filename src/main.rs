use anyhow::Result;
use clap::Parser;
use log::info;
use oxftpd::constants::SERVER_NAME;
use oxftpd::core_cli::Cli;
use oxftpd::core_log::init_logger;
use oxftpd::{server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    init_logger(args.verbose);
    info!("Starting {} {}", SERVER_NAME, env!("CARGO_PKG_VERSION"));

    // Load configuration from the TOML file
    let mut config = Config::load_from_file(args.config_path())?;
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }

    // Run the FTP server
    server::run(config).await?;

    Ok(())
}
