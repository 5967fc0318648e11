//! Research command implementation.

use crate::cli::output::truncate;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{CoercionStrategy, Settings};
use crate::error::DelveError;
use crate::research::{ResearchOutcome, ResearchReport, Researcher};
use crate::research_log::save_to_text;
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    query: &str,
    model: Option<String>,
    restructure: bool,
    json: bool,
    save: bool,
    settings: Settings,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(DelveError::InvalidInput("Query is empty".to_string()).into());
    }

    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'delve doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut researcher = Researcher::from_settings(&settings)?;
    if let Some(model) = model {
        researcher = researcher.with_model(&model);
    }
    if restructure {
        researcher = researcher.with_strategy(CoercionStrategy::Restructure);
    }

    let spinner = Output::spinner(&format!("Researching with {}...", researcher.model()));

    let report = match researcher.run(query, &[]).await {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Research failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        let body = serde_json::json!({ "response": report.outcome });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_report(&report);
    }

    if save {
        let text = match &report.outcome {
            ResearchOutcome::Structured(result) => result.to_log_text(),
            ResearchOutcome::Raw { output, .. } => output.clone(),
        };
        let message = save_to_text(&text, &settings.output_file())?;
        Output::success(&message);
    }

    Ok(())
}

fn print_report(report: &ResearchReport) {
    match &report.outcome {
        ResearchOutcome::Structured(result) => Output::research_result(result),
        ResearchOutcome::Raw { output, error } => {
            Output::warning(&format!("Could not parse a structured result: {}", error));
            println!("\n{}\n", output);
        }
    }

    if !report.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", report.tool_calls.len()));
        for call in &report.tool_calls {
            Output::info(&format!("  {} {}", call.name, truncate(&call.arguments, 60)));
        }
        println!();
    }

    Output::info(&format!("Completed in {} iteration(s)", report.iterations));
}
