//! Pre-flight checks before talking to the model.
//!
//! Validates that the credential and output location are usable before a
//! research run starts, so it does not fail after the first model call.

use crate::config::Settings;
use crate::error::{DelveError, Result};

/// Run pre-flight checks for a research run.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    settings.llm.resolve_api_key()?;
    check_output_dir(settings)?;
    Ok(())
}

/// Check that the output file's directory exists.
fn check_output_dir(settings: &Settings) -> Result<()> {
    let output = settings.output_file();
    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => Err(DelveError::Config(format!(
            "Output directory {} does not exist",
            dir.display()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key() -> Settings {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("key".to_string());
        settings
    }

    #[test]
    fn test_check_passes_with_key_and_relative_output() {
        assert!(check(&settings_with_key()).is_ok());
    }

    #[test]
    fn test_check_rejects_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_with_key();
        settings.general.output_file = dir.path().join("missing").join("out.txt").to_string_lossy().to_string();
        assert!(check(&settings).is_err());
    }

    #[test]
    fn test_check_rejects_missing_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "DELVE_TEST_PREFLIGHT_KEY".to_string();
        settings.llm.dotenv_path = "/nonexistent/.env".to_string();
        assert!(check(&settings).is_err());
    }
}
