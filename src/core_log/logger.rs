use chrono::Local;
use colored::Colorize;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

pub fn colored_level(level: Level) -> String {
    let name = level.to_string();
    match level {
        Level::Error => name.red().bold().to_string(),
        Level::Warn => name.yellow().to_string(),
        Level::Info => name.green().to_string(),
        Level::Debug => name.blue().to_string(),
        Level::Trace => name.dimmed().to_string(),
    }
}

/// Installs the global logger. `RUST_LOG` wins over `verbose`.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                colored_level(record.level()),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_level_keeps_name() {
        colored::control::set_override(false);
        assert_eq!(colored_level(Level::Warn), "WARN");
        assert_eq!(colored_level(Level::Error), "ERROR");
        colored::control::unset_override();
    }
}
