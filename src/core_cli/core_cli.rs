use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "oxftpd", about = "An FTP daemon written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Listen on this port instead of the configured one
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config_path(&self) -> &str {
        if self.config.is_empty() {
            crate::constants::DEFAULT_CONFIG_PATH
        } else {
            self.config.as_str()
        }
    }
}
