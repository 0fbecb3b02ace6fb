//! Serve command handler
//!
//! Opens a project, starts the transport and content servers, and runs until
//! Ctrl-C. With `--emit-events` every host event is also written to stdout as
//! one JSON object per line, so a UI shell can follow along.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::ServeArgs;
use crate::commands::{init_tracing, runtime, CommandContext};
use crate::error::{LiveSpecError, Result};
use crate::paths;
use crate::server::{EventBus, ProjectSession, SessionOptions};

/// Run the live servers
pub fn run_serve(args: &ServeArgs, ctx: &CommandContext) -> Result<String> {
    init_tracing(ctx.log_level());
    runtime()?.block_on(run_serve_async(args, ctx))?;

    // Events (if any) already went to stdout
    Ok(String::new())
}

async fn run_serve_async(args: &ServeArgs, ctx: &CommandContext) -> Result<()> {
    let project = paths::resolve_path(args.path.as_deref())?;
    tracing::info!("Starting livespec v{}", env!("CARGO_PKG_VERSION"));

    let mut options = SessionOptions::from(&ctx.config);
    options.watch = !args.no_watch;
    let events = Arc::new(EventBus::new(args.emit_events));
    let session = ProjectSession::new(options, events);

    let root = open(&session, project).await?;

    let ws_port = args.ws_port.unwrap_or(ctx.config.server.ws_port);
    let http_port = args.http_port.unwrap_or(ctx.config.server.http_port);
    let started = session.start_server(Some(ws_port), Some(http_port)).await;
    if !started.success {
        session.shutdown().await;
        return Err(LiveSpecError::Transport {
            message: format!(
                "Failed to start servers on ports {} (ws) / {} (http)",
                ws_port, http_port
            ),
        });
    }

    tracing::info!(
        "Serving {} at http://{}:{} (transport ws://{}:{})",
        root.display(),
        ctx.config.server.host,
        started.http_port,
        ctx.config.server.host,
        started.ws_port
    );
    if session.is_watching() {
        tracing::info!("Watching for changes, press Ctrl-C to stop");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutting down");
    session.shutdown().await;
    Ok(())
}

async fn open(session: &ProjectSession, project: PathBuf) -> Result<PathBuf> {
    if !project.is_dir() {
        return Err(LiveSpecError::FileNotFound {
            path: project.display().to_string(),
        });
    }
    session
        .open_project(Some(&project))
        .await
        .ok_or(LiveSpecError::NoProject)
}
