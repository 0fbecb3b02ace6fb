//! Config command handler

use std::path::Path;

use crate::cli::{ConfigArgs, ConfigOperation};
use crate::commands::CommandContext;
use crate::config::LiveSpecConfig;
use crate::error::{LiveSpecError, Result};

/// Show, query or edit the configuration file
pub fn run_config(args: &ConfigArgs, ctx: &CommandContext) -> Result<String> {
    match &args.operation {
        ConfigOperation::Show => {
            let location = match &ctx.config_path {
                Some(path) => format!("# {}\n", path.display()),
                None => String::new(),
            };
            Ok(format!("{}{}", location, ctx.config.display()))
        }
        ConfigOperation::Get { key } => ctx
            .config
            .get(key)
            .map(|value| format!("{}\n", value))
            .ok_or_else(|| LiveSpecError::ConfigError {
                message: format!("Unknown or unset configuration key: {}", key),
            }),
        ConfigOperation::Set { key, value } => {
            let path = ctx.require_config_path()?;
            set_value(&path, key, value)?;
            Ok(format!("Set {} = {}\n", key, value))
        }
        ConfigOperation::Reset => {
            let path = ctx.require_config_path()?;
            LiveSpecConfig::default().save_to(&path)?;
            Ok(format!("Reset configuration at {}\n", path.display()))
        }
    }
}

/// Load, update and atomically rewrite the file at `path`
fn set_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = LiveSpecConfig::load_from(path)?;
    config.set(key, value)?;
    config.save_to(path)
}
