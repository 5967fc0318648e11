//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Delve Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let sections = vec![
        ("Model", vec![check_api_key(settings), check_model(settings)]),
        ("Tools", vec![check_wikipedia(settings), check_output_file(&settings.output_file())]),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Please fix them before using Delve.", errors));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Delve is ready to use.");
    }

    Ok(())
}

/// Check that an API key can be resolved.
fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.llm.api_key_env.as_str();
    match settings.llm.resolve_api_key() {
        Ok(key) => CheckResult::ok(name, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(
            name,
            "not set",
            &format!(
                "Set with: export {}='...' or add it to {}",
                name, settings.llm.dotenv_path
            ),
        ),
    }
}

fn check_model(settings: &Settings) -> CheckResult {
    if settings.llm.model.trim().is_empty() {
        return CheckResult::error("Model", "no model configured", "Set llm.model in the config file");
    }
    CheckResult::ok(
        "Model",
        &format!("{} @ {}", settings.llm.model, settings.llm.api_base),
    )
}

fn check_wikipedia(settings: &Settings) -> CheckResult {
    let wiki = &settings.wikipedia;
    let message = format!(
        "{} ({} result(s), {} chars)",
        wiki.endpoint(),
        wiki.top_k_results,
        wiki.doc_content_chars_max
    );
    if wiki.top_k_results == 0 || wiki.doc_content_chars_max == 0 {
        CheckResult::warning(
            "Wikipedia",
            &message,
            "Lookups will return nothing; raise top_k_results and doc_content_chars_max",
        )
    } else {
        CheckResult::ok("Wikipedia", &message)
    }
}

/// Check the research output file location.
fn check_output_file(path: &Path) -> CheckResult {
    if path.exists() {
        let size = std::fs::metadata(path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        return CheckResult::ok("Output file", &format!("{} ({})", path.display(), size));
    }

    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => CheckResult::error(
            "Output file",
            &format!("directory {} does not exist", dir.display()),
            "Create the directory or change general.output_file",
        ),
        _ => CheckResult::warning(
            "Output file",
            &format!("{} (not created yet)", path.display()),
            "It will be created on the first save",
        ),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: delve config edit")
    }
}

/// Show only the first and last characters of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
