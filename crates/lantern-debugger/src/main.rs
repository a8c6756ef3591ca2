use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lantern_config::LanternConfig;
use lantern_debugger::host::{ScriptedHost, ScriptedProgram};
use lantern_debugger::ids::DebuggeeHandle;
use lantern_debugger::{server, DebugSession, SessionSlot};
use tokio::sync::mpsc;

/// Lantern script debugger.
///
/// Runs a scripted program as the debug target and serves the debugger
/// protocol over stdio. The front-end attaches the program by sending
/// `add-debuggee` with the handle given by `--debuggee`.
#[derive(Debug, Parser)]
#[command(name = "lantern-debugger", version, about)]
struct Cli {
    /// Path to a TOML config file.
    ///
    /// If unset, `LANTERN_CONFIG` is used as a fallback. When neither is
    /// provided the built-in defaults apply.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON description of the program to debug.
    #[arg(long)]
    program: PathBuf,

    /// Handle under which the program's global is exposed.
    #[arg(long, default_value_t = 1)]
    debuggee: u64,

    /// Pause when the program enters its first frame.
    #[arg(long)]
    stop_on_entry: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = LanternConfig::load_or_default(cli.config);
    lantern_debugger::hardening::init(&config);

    let text = std::fs::read_to_string(&cli.program)
        .with_context(|| format!("failed to read program {}", cli.program.display()))?;
    let program = ScriptedProgram::from_json(&text)
        .with_context(|| format!("failed to parse program {}", cli.program.display()))?;
    let host = Arc::new(ScriptedHost::new(program));

    let slot = SessionSlot::new();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let session = DebugSession::init(&slot, host.clone(), config.session, outbound_tx)?;
    if cli.stop_on_entry {
        session.interrupt()?;
    }

    let hooks = session.hooks();
    let debuggee = DebuggeeHandle(cli.debuggee);
    let target = tokio::spawn(async move { host.run(&hooks, debuggee).await });

    let served = server::run(
        tokio::io::stdin(),
        tokio::io::stdout(),
        session,
        outbound_rx,
        config.transport,
    )
    .await;
    target.abort();
    served.context("protocol stream failed")
}
