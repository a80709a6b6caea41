//! Config command - show or initialise the settings file.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use crate::settings::{save_settings, Settings};
use crate::OutputFormat;

/// Arguments for the config command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the effective settings to the settings file.
    #[arg(long)]
    pub init: bool,
}

/// Prints the effective settings, or writes them with `--init`.
///
/// # Errors
///
/// Returns an error if the settings cannot be serialised or written.
pub fn execute(args: &ConfigArgs, path: &Path, settings: &Settings, format: OutputFormat) -> Result<()> {
    if args.init {
        save_settings(path, settings).map_err(|e| anyhow!(e))?;
        eprintln!("Wrote {}", path.display());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(settings)?),
        OutputFormat::Text => {
            println!("settings file:  {}", path.display());
            println!("cache:          {}", settings.data_file.display());
            match &settings.remote {
                Some(remote) => println!("remote:         {remote:?}"),
                None => println!("remote:         (none)"),
            }
            println!("statuses:       {}", settings.statuses.join(", "));
            println!("log level:      {}", settings.log_level);
            println!("edit debounce:  {} ms", settings.edit_debounce_ms);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::load_settings;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("research-queue").join("settings.json");
        let settings = Settings {
            edit_debounce_ms: 50,
            ..Settings::default()
        };
        execute(&ConfigArgs { init: true }, &path, &settings, OutputFormat::Text).unwrap();
        assert_eq!(load_settings(&path), settings);
    }
}
