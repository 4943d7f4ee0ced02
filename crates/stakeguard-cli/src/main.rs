//! stakeguard - chat your way to a staked invoice

mod commands;
mod config;
mod display;
mod server;
mod utils;

use clap::Parser;
use stakeguard_invoice::{Extractor, InvoiceLedger, LocalExtractor, RemoteExtractor, RetryConfig};
use stakeguard_session::{
    CommitBoundary, ConfirmMode, ControllerConfig, HttpCommitBoundary, Session, SessionEvent,
    SimulatedCommit,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// stakeguard - conversational invoice assistant with staking
#[derive(Parser, Debug)]
#[command(name = "stakeguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Extract invoice fields from TEXT, print them as JSON and exit
    #[arg(short, long, value_name = "TEXT")]
    extract: Option<String>,

    /// Serve the extraction endpoint over HTTP
    #[arg(long)]
    serve: bool,

    /// Address for --serve (default: 127.0.0.1:3000)
    #[arg(long)]
    bind: Option<String>,

    /// How complete extractions are confirmed (immediate, free-text)
    #[arg(long)]
    confirm_mode: Option<String>,

    /// Use a remote extraction endpoint
    #[arg(long)]
    extractor_url: Option<String>,

    /// Commit invoices to an HTTP endpoint instead of simulating
    #[arg(long)]
    commit_url: Option<String>,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_confirm_mode(s: &str) -> Option<ConfirmMode> {
    match s.to_lowercase().as_str() {
        "immediate" => Some(ConfirmMode::Immediate),
        "free-text" | "free_text" | "freetext" => Some(ConfirmMode::FreeText),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("stakeguard=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let mut controller = cfg.controller_config();
    if let Some(ref mode) = args.confirm_mode {
        match parse_confirm_mode(mode) {
            Some(mode) => controller.confirm_mode = mode,
            None => {
                eprintln!("Error: unknown confirm mode '{}' (expected immediate or free-text)", mode);
                std::process::exit(2);
            }
        }
    }

    if args.serve {
        let bind = args.bind.unwrap_or_else(|| cfg.bind_address());
        // The endpoint always extracts in-process; a remote extractor here
        // would only forward to another instance of itself.
        let state = server::AppState {
            extractor: Arc::new(LocalExtractor::new()),
        };
        return server::run(&bind, state).await;
    }

    let extractor = build_extractor(&cfg, args.extractor_url.as_deref())?;

    if let Some(text) = args.extract {
        return run_extract(extractor.as_ref(), &text).await;
    }

    let committer = build_committer(&cfg, args.commit_url.as_deref());
    let ledger = Arc::new(InvoiceLedger::new());
    run_interactive(controller, extractor, committer, ledger).await
}

/// Local by default; remote when a URL is given on the command line or the
/// config selects it.
fn build_extractor(
    cfg: &config::Config,
    url_override: Option<&str>,
) -> anyhow::Result<Arc<dyn Extractor>> {
    let settings = &cfg.extractor;
    let url = match url_override {
        Some(url) => Some(url.to_string()),
        None if settings.mode.as_deref() == Some("remote") => settings.url.clone(),
        None => None,
    };

    if settings.mode.as_deref() == Some("remote") && url.is_none() {
        anyhow::bail!("extractor mode is 'remote' but no extractor url is configured");
    }

    match url {
        Some(url) => {
            let mut retry = RetryConfig::default();
            if let Some(max_retries) = settings.max_retries {
                retry.max_retries = max_retries;
            }
            tracing::debug!("Using remote extractor at {}", url);
            Ok(Arc::new(RemoteExtractor::new(url)?.with_retry_config(retry)))
        }
        None => Ok(Arc::new(LocalExtractor::new())),
    }
}

fn build_committer(cfg: &config::Config, url_override: Option<&str>) -> Arc<dyn CommitBoundary> {
    let settings = &cfg.commit;
    let url = url_override.map(str::to_string).or_else(|| {
        if settings.mode.as_deref() == Some("http") {
            settings.url.clone()
        } else {
            None
        }
    });

    match url {
        Some(url) => {
            tracing::debug!("Committing invoices to {}", url);
            Arc::new(HttpCommitBoundary::new(url))
        }
        None => {
            if settings.mode.as_deref() == Some("http") {
                eprintln!("Warning: commit mode is 'http' but no url is configured; simulating commits");
            }
            let delay = Duration::from_millis(settings.delay_ms.unwrap_or(2000));
            Arc::new(SimulatedCommit::new(delay))
        }
    }
}

async fn run_extract(extractor: &dyn Extractor, text: &str) -> anyhow::Result<()> {
    match extractor.extract(text).await {
        Ok(extracted) => {
            println!("{}", serde_json::to_string_pretty(&extracted)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn new_session(
    controller: &ControllerConfig,
    extractor: &Arc<dyn Extractor>,
    committer: &Arc<dyn CommitBoundary>,
    ledger: &Arc<InvoiceLedger>,
) -> (Session, broadcast::Receiver<SessionEvent>) {
    let session = Session::new(
        controller.clone(),
        Arc::clone(extractor),
        Arc::clone(committer),
        ledger.clone(),
    );
    let receiver = session.subscribe();

    let state = session.state();
    println!("{}", display::render_step(state.step()));
    for message in state.messages() {
        if let Some(text) = display::render_message(message) {
            println!("{}", text);
        }
    }
    println!();
    (session, receiver)
}

async fn run_interactive(
    controller: ControllerConfig,
    extractor: Arc<dyn Extractor>,
    committer: Arc<dyn CommitBoundary>,
    ledger: Arc<InvoiceLedger>,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (mut session, mut receiver) = new_session(&controller, &extractor, &committer, &ledger);

    if io::IsTerminal::is_terminal(&io::stderr()) {
        eprintln!(
            "stakeguard session: {} (type /help for commands)",
            utils::short_id(session.id())
        );
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let action = match commands::execute_command(input, &session, &ledger) {
            None => stakeguard_session::Action::SendMessage {
                text: input.to_string(),
            },
            Some(commands::CommandResult::Dispatch(action)) => action,
            Some(commands::CommandResult::Message(msg)) => {
                println!("{}", msg);
                continue;
            }
            Some(commands::CommandResult::NewSession) => {
                (session, receiver) = new_session(&controller, &extractor, &committer, &ledger);
                continue;
            }
            Some(commands::CommandResult::Exit) => break,
            Some(commands::CommandResult::Unknown(cmd)) => {
                println!("Unknown command: /{}", cmd);
                println!("Type /help for available commands.");
                continue;
            }
        };

        if let Err(e) = session.dispatch(action).await {
            eprintln!("{}", e);
            if e == stakeguard_session::Error::Closed {
                eprintln!("Type /new to start another invoice.");
            }
        }

        // Events are published before dispatch returns
        while let Ok(event) = receiver.try_recv() {
            if let Some(text) = display::render_event(&event) {
                println!("{}", text);
            }
        }
        println!();
    }

    Ok(())
}
