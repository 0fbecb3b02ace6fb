//! Listen command handler
//!
//! Connects to a running transport as a guest, the way an injected page
//! would, and prints each action that page would take as a JSON line.
//! Lines on stdin are treated as commands posted by the enclosing frame
//! from `--origin`.

use serde_json::json;
use tokio::sync::{mpsc, watch};

use crate::bridge::{apply_command, BridgeAction, BridgeClient, OriginPolicy, ReconnectPolicy};
use crate::cli::ListenArgs;
use crate::commands::{init_tracing, runtime, CommandContext};
use crate::error::Result;

/// Run the native bridge client until Ctrl-C
pub fn run_listen(args: &ListenArgs, ctx: &CommandContext) -> Result<String> {
    init_tracing(ctx.log_level());
    runtime()?.block_on(run_listen_async(args, ctx))?;
    Ok(String::new())
}

async fn run_listen_async(args: &ListenArgs, ctx: &CommandContext) -> Result<()> {
    let host = args.host.as_deref().unwrap_or(&ctx.config.server.host);
    let port = args.ws_port.unwrap_or(ctx.config.server.ws_port);
    let ws_url = format!("ws://{}:{}", host, port);

    let mut client = BridgeClient::new(
        ws_url.clone(),
        args.url.clone(),
        ReconnectPolicy::from(&ctx.config.bridge),
    );
    tracing::info!("Listening on {} as {}", ws_url, client.client_id());

    let (actions_tx, mut actions_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let policy = OriginPolicy::new(ctx.config.bridge.allowed_origins.iter().cloned());
    spawn_command_reader(policy, args.origin.clone(), actions_tx.clone());

    let printer = tokio::spawn(async move {
        while let Some(action) = actions_rx.recv().await {
            println!("{}", describe(&action));
        }
    });

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = client.run(actions_tx, shutdown_rx) => {
            tracing::info!("Gave up reconnecting to {}", ws_url);
        }
        _ = ctrl_c => {
            let _ = shutdown_tx.send(true);
        }
    }

    // The stdin reader may still hold a sender, so stop printing here
    drop(client);
    printer.abort();
    Ok(())
}

/// Read host commands from stdin on a plain thread; a tokio stdin read
/// would hold runtime shutdown until the next line arrives
fn spawn_command_reader(
    policy: OriginPolicy,
    origin: String,
    actions: mpsc::UnboundedSender<BridgeAction>,
) {
    let spawned = std::thread::Builder::new()
        .name("livespec-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match apply_command(&policy, &origin, line) {
                    Some(action) => {
                        if actions.send(action).is_err() {
                            break;
                        }
                    }
                    None => tracing::warn!("Rejected host command from {}: {}", origin, line),
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("Host commands disabled, stdin reader failed to start: {}", e);
    }
}

/// One JSON line per action
pub fn describe(action: &BridgeAction) -> String {
    let value = match action {
        BridgeAction::Reload { file_path } => json!({"action": "reload", "filePath": file_path}),
        BridgeAction::Relay(message) => json!({"action": "relay", "message": message}),
        BridgeAction::Command(command) => json!({"action": "command", "command": command}),
    };
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{GuestMessage, HostCommand};

    #[test]
    fn test_describe_actions() {
        let reload = describe(&BridgeAction::Reload {
            file_path: "/p/index.html".to_string(),
        });
        assert_eq!(reload, r#"{"action":"reload","filePath":"/p/index.html"}"#);

        let relay = describe(&BridgeAction::Relay(GuestMessage::GraphUpdated {
            graph: json!({"meta": {"name": "G"}}),
        }));
        let value: serde_json::Value = serde_json::from_str(&relay).unwrap();
        assert_eq!(value["message"]["type"], "GRAPH_UPDATED");

        let command = describe(&BridgeAction::Command(HostCommand::NavigateTo {
            url: "/b.html".to_string(),
            reload: None,
        }));
        assert_eq!(
            command,
            r#"{"action":"command","command":{"type":"NAVIGATE_TO","url":"/b.html"}}"#
        );
    }
}
