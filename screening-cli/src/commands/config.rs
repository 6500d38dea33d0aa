use std::fs;

use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;

/// Generates a configuration file holding the defaults in the specified format.
///
/// # Arguments
/// * `format` - The format of the configuration file ("yaml" or "json").
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str) -> Result<()> {
    let file_name = match format {
        "yaml" => "config.yaml",
        "json" => "config.json",
        _ => bail!("Unsupported format. Use 'yaml' or 'json'."),
    };

    let serialized = ClientConfig::with_defaults().render(format)?;
    fs::write(file_name, serialized)
        .with_context(|| format!("failed to write configuration file '{file_name}'"))?;

    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}
