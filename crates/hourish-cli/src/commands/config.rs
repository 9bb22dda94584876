//! Settings commands for CLI.

use clap::Subcommand;
use hourish_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting (e.g. "session.grace_delay_ms")
    Get {
        /// Dotted setting key
        key: String,
    },
    /// Change one setting, keeping its type
    Set {
        /// Dotted setting key (e.g. "session.tick_interval_ms")
        key: String,
        /// New value
        value: String,
    },
    /// Print every setting as JSON
    List,
    /// Print where config.toml lives
    Path,
    /// Restore default session timing and display settings
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("no such setting: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            println!(
                "settings reset (tick {} ms, grace {} ms)",
                defaults.session.tick_interval_ms, defaults.session.grace_delay_ms
            );
        }
    }
    Ok(())
}
