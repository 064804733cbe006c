//! The `settings` subcommands, for inspecting the user's `settings.toml`.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::Result;
use clap::Subcommand;

/// Subcommands for settings
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Print where the settings file is read from
    Path,
    /// Print a `settings.toml` containing the default value of every setting
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        let text = match self {
            Self::Path => get_settings_file_path().display().to_string(),
            Self::DumpDefault => Settings::default_file_contents()?,
        };
        println!("{}", text.trim_end());

        Ok(())
    }
}
