use anyhow::{Context, Result};
use booknotes::config::Credentials;
use booknotes::notion::NotionClient;
use booknotes::openai::OpenAiClient;
use booknotes::poller::{Poller, RecordOutcome};
use booknotes::processing::summarizer::Summarizer;
use booknotes::shutdown::Shutdown;

use super::Globals;

/// `run` — poll forever (or once with `--once`).
pub fn run(globals: &Globals, once: bool, interval_secs: Option<u64>) -> Result<()> {
    globals.load_env()?;
    let creds = Credentials::from_env().context("Cannot start poller")?;

    let mut settings = globals.settings();
    if let Some(secs) = interval_secs {
        settings.poll_interval_secs = secs;
    }

    let notion = NotionClient::new(&creds.notion_token, &settings.notion);
    let openai = OpenAiClient::new(&creds.openai_api_key, &settings.openai);
    tracing::info!(model = openai.model(), "Using completion model");
    let summarizer = Summarizer::new(openai);

    let mut poller = Poller::new(
        &notion,
        &summarizer,
        &creds.library_db_id,
        &creds.notes_db_id,
        settings,
    );

    if once {
        let report = poller.run_cycle().context("Library query failed")?;
        for outcome in &report.outcomes {
            match outcome {
                RecordOutcome::Created {
                    title,
                    note_id,
                    append_error: None,
                    ..
                } => println!("created  {}  ({})", title, note_id),
                RecordOutcome::Created {
                    title,
                    note_id,
                    append_error: Some(error),
                    ..
                } => println!("partial  {}  ({})  {}", title, note_id, error),
                RecordOutcome::AlreadyProcessed { source_id } => println!("skipped  {}", source_id),
                RecordOutcome::Failed { source_id, error } => {
                    println!("failed   {}  {}", source_id, error)
                }
            }
        }
        println!(
            "{} fetched, {} created, {} failed",
            report.fetched, report.created, report.failed
        );
        return Ok(());
    }

    let shutdown = Shutdown::new();
    shutdown
        .install_signal_handlers()
        .context("Failed to install signal handlers")?;
    poller.run(&shutdown);
    Ok(())
}
