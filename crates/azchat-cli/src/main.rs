use std::io;
use std::process::ExitCode;
use std::time::Duration;

use azchat::clients::azure_openai::{Client, ClientOptions, DEFAULT_TIMEOUT};
use azchat::config::Config;
use azchat::session::{LineReader, Session};
use azchat::transcript::{DEFAULT_SYSTEM_PROMPT, Transcript};
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with an Azure OpenAI deployment from the terminal.
///
/// Reads AZURE_OPENAI_API_KEY, AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_DEPLOYMENT
/// and optionally AZURE_OPENAI_API_VERSION from the environment. Type 'exit'
/// or 'quit' to leave, 'reset' to clear the history.
#[derive(Parser)]
#[command(author, version, about, long_about)]
struct Cli {
    /// System message that starts every conversation
    #[arg(long, env = "AZURE_OPENAI_SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Skip TLS certificate verification (development proxies only)
    #[arg(long, action, default_value = "false")]
    insecure: bool,
}

struct Editor(DefaultEditor);

impl LineReader for Editor {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.0.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.0.add_history_entry(line.as_str()) {
                        tracing::debug!(error = %err, "failed to record line in history");
                    }
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "azchat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Cli::parse();

    // Configuration problems are fatal and must surface before any request.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli, config: Config) -> azchat::Result<()> {
    tracing::debug!(
        endpoint = %config.endpoint,
        deployment = %config.deployment,
        api_version = %config.api_version,
        "starting chat session"
    );

    let options = ClientOptions {
        timeout: Duration::from_secs(args.timeout_secs),
        insecure: args.insecure,
    };
    let mut editor = Editor(DefaultEditor::new().map_err(io::Error::other)?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let client = Client::new(&config, &options)?;
        let mut session = Session::new(client, Transcript::new(args.system_prompt));
        session
            .run(&mut editor, &mut io::stdout(), &mut io::stderr())
            .await
    })
}
