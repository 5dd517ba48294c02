use anyhow::{Context, Result};
use booknotes::constants::ENV_OPENAI_KEY;
use booknotes::openai::OpenAiClient;
use booknotes::processing::chunker;
use booknotes::processing::summarizer::{Summarizer, SummaryGenerator};

use super::Globals;

/// `summarize <title>` — dry run of the generator and chunker.
pub fn run(globals: &Globals, title: &str, max_len: Option<usize>) -> Result<()> {
    globals.load_env()?;
    let api_key = std::env::var(ENV_OPENAI_KEY)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("{} is not set", ENV_OPENAI_KEY))?;

    let settings = globals.settings();
    let summarizer = Summarizer::new(OpenAiClient::new(&api_key, &settings.openai));
    let summary = summarizer.generate(title)?;

    let max_len = max_len.unwrap_or(settings.max_block_len);
    println!("## Summary of {}", title);
    for (i, block) in chunker::Chunks::new(&summary, max_len).enumerate() {
        println!("\n--- block {} ({} chars) ---", i + 1, block.chars().count());
        println!("{}", block);
    }
    Ok(())
}
