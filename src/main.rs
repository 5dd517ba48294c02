mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "booknotes", version, about = "Summarize completed books into Notion notes")]
struct App {
    /// Settings file (defaults to {config_dir}/booknotes/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Env file with credentials (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the library and write notes (default)
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
        /// Override the poll interval (seconds)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Generate and print a chunked summary without writing to Notion
    Summarize {
        /// Book title
        title: String,
        /// Max characters per block
        #[arg(long)]
        max_len: Option<usize>,
    },
    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display effective settings and (masked) credentials
    Show,
    /// Get a settings value (dot notation: openai.model)
    Get {
        /// Settings key (dot notation)
        key: String,
    },
}

fn main() {
    let app = App::parse();

    let log_target = match &app.log_file {
        Some(path) => {
            let expanded = booknotes::paths::expand_tilde(&path.to_string_lossy());
            booknotes::tracing_init::init_file_tracing(&PathBuf::from(expanded))
        }
        None => booknotes::tracing_init::init_stderr_tracing(),
    };

    let globals = cli::Globals {
        config: app.config,
        env_file: app.env_file,
    };

    let result = match app.command {
        // No subcommand → start polling right away
        None => cli::run::run(&globals, false, None),
        Some(Commands::Run { once, interval_secs }) => cli::run::run(&globals, once, interval_secs),
        Some(Commands::Summarize { title, max_len }) => cli::summarize::run(&globals, &title, max_len),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => cli::config::run_show(&globals),
            ConfigAction::Get { key } => cli::config::run_get(&globals, &key),
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{:#}", e), "Fatal");
        // Logs went to a file, so echo the error to the terminal.
        if !log_target.is_stderr() {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
