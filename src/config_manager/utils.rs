use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

/// Read a configuration file and expand `${VAR_NAME}` references from the environment.
///
/// Unknown variables are left in place so that a later serde error points at them.
pub fn read_config_text(config_path: &str) -> Result<String> {
    if !Path::new(config_path).exists() {
        anyhow::bail!("Configuration file not found: {}", config_path);
    }

    let content = load_text_file_with_guess_encoding(config_path)?;
    if content.trim().is_empty() {
        anyhow::bail!("Configuration file is empty: {}", config_path);
    }

    substitute_env_vars(&content)
}

/// Replace `${VAR_NAME}` with the value of the environment variable, if set.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let expanded = pattern.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                debug!("Environment variable {} not set, leaving placeholder", var_name);
                caps[0].to_string()
            }
        }
    });
    Ok(expanded.into_owned())
}

/// Load a text file, honouring a UTF-8/UTF-16 byte order mark when present.
pub fn load_text_file_with_guess_encoding(file_path: &str) -> Result<String> {
    let bytes = fs::read(file_path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let (encoding, bom_len) =
        encoding_rs::Encoding::for_bom(&bytes).unwrap_or((encoding_rs::UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors {
        warn!(
            "Configuration file {} is not valid {}; invalid bytes were replaced",
            file_path,
            encoding.name()
        );
    }

    Ok(text.into_owned())
}
