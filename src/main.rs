//! conduit - interactive tool-calling agent over MCP
//!
//! Main entry point for the CLI application.

use std::io;
use std::sync::Arc;

use clap::Parser;
use conduit::cli::signal;
use conduit::cli::{run_until_interrupted, RunEnd};
use conduit::mcp::McpToolHost;
use conduit::{
    Config, LLMProvider, OpenAIClient, Orchestrator, Printer, Repl, SessionManager, ToolHost,
};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// conduit - chat with a model that can call the tools of an MCP server
#[derive(Parser, Debug)]
#[command(name = "conduit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server script (.py or .js) or executable
    server_script_path: String,

    /// Model name
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum model calls per user turn
    #[arg(long)]
    max_turns: Option<usize>,

    /// Wait for complete responses instead of streaming
    #[arg(long)]
    no_stream: bool,

    /// Do not write a transcript
    #[arg(long)]
    no_transcript: bool,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.llm.model = model.clone();
    }

    if let Some(max_turns) = args.max_turns {
        config.agent.max_turns = max_turns;
    }

    if args.no_stream {
        config.agent.streaming = false;
    }

    if args.no_transcript {
        config.transcript.enabled = false;
    }

    let printer = if config.transcript.enabled {
        let (printer, path) = Printer::with_transcript(&config.transcript.dir)?;
        tracing::info!(path = %path.display(), "writing transcript");
        printer
    } else {
        Printer::stdout()
    };

    let llm = Arc::new(OpenAIClient::from_config(&config.llm)?);
    tracing::info!(provider = llm.name(), model = llm.model(), "model service configured");

    let session = SessionManager::connect(&args.server_script_path, &config.host).await?;
    let host = session.host();

    let end = run_until_interrupted(
        run(&args, &config, llm, host, printer),
        signal::ctrl_c(),
    )
    .await;

    let launch_target = session.launch_target().to_string();
    let closed = session.close().await;

    match end {
        RunEnd::Finished(outcome) => {
            outcome?;
            closed?;
            Ok(())
        }
        RunEnd::Interrupted => {
            if let Err(e) = closed {
                tracing::warn!(error = %e, "session teardown failed");
            }
            tracing::info!(%launch_target, "interrupted, session closed");
            // A pending stdin read would otherwise hold the runtime open
            std::process::exit(130);
        }
    }
}

/// Everything between connecting and closing the session
async fn run(
    args: &Args,
    config: &Config,
    llm: Arc<OpenAIClient>,
    host: McpToolHost,
    printer: Printer,
) -> anyhow::Result<()> {
    let tools = host.list_tools().await?;
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    printer.println(&format!(
        "\nConnected to server with tools: [{}]",
        names.join(", ")
    ));

    let orchestrator = Orchestrator::new(llm, Arc::new(host), config);
    tracing::debug!(
        provider = orchestrator.provider_name(),
        max_turns = orchestrator.config().max_turns,
        streaming = orchestrator.is_streaming(),
        "orchestrator ready"
    );
    let mut repl = Repl::new(orchestrator, printer);

    match args.prompt {
        Some(ref prompt) => repl.run_once(prompt).await?,
        None => repl.run(BufReader::new(tokio::io::stdin())).await?,
    }

    Ok(())
}

/// Send logs to stderr, filtered by `RUST_LOG` or the debug flag
fn init_logging(debug: bool) {
    let default_level = if debug { "conduit=debug" } else { "conduit=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
