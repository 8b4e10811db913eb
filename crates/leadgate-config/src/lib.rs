// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Leadgate server.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and Elm-style diagnostic error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use leadgate_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Site name: {}", config.site.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LeadgateConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to rich miette diagnostics with typo suggestions
///
/// Returns either a valid `LeadgateConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<LeadgateConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Re-read the TOML files so diagnostics can carry source spans.
            let sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<LeadgateConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![diagnostic::TomlSource::new("<inline>", toml_content)];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<diagnostic::TomlSource> {
    let mut sources = Vec::new();

    // Local config
    if let Ok(content) = std::fs::read_to_string("leadgate.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("leadgate.toml").display().to_string())
            .unwrap_or_else(|_| "leadgate.toml".to_string());
        sources.push(diagnostic::TomlSource::new(path, content));
    }

    // XDG user config
    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("leadgate/leadgate.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push(diagnostic::TomlSource::new(path.display().to_string(), content));
        }
    }

    // System config
    let system_path = std::path::Path::new("/etc/leadgate/leadgate.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push(diagnostic::TomlSource::new(
            system_path.display().to_string(),
            content,
        ));
    }

    sources
}
