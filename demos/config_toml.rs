//! Example of loading logger configuration from a TOML file.
//!
//! Run with:
//! ```bash
//! cargo run --example config_toml
//! ```

use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct Config {
    log: sevlog::LogConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = "demos/config.toml";
    let config_content = fs::read_to_string(config_path)
        .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));

    let root: Config = toml::from_str(&config_content)?;
    let logger = sevlog::Logger::new(root.log)?;

    logger.log(sevlog::Severity::Crit, "This is a critical message");
    logger.log(sevlog::Severity::Med, "This is a medium message");
    logger.log(sevlog::Severity::Debug, "This is a debug message (filtered out)");

    println!("Logging to {}", logger.name());
    Ok(())
}
