//! Echo Bot Example
//!
//! A terminal-driven demonstration of the Machina framework: every line
//! you type becomes a message event in the channel `C1`, and replies are
//! printed back to the terminal.
//!
//! # Addressing the bot
//!
//! `C1` is a channel-style destination, so the routing treats plain lines
//! as overheard chatter and only mention-prefixed lines as directed at
//! the bot:
//!
//! ```text
//! ping                 -> listen_to actions (the ping-pong builtin answers)
//! machina: help        -> respond_to actions (the help builtin answers)
//! machina: echo hi     -> the echo plugin below answers
//! ```
//!
//! The heartbeat plugin also runs on a cron trigger once a minute, to
//! show scheduled actions going through the same pipeline.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use machina::prelude::*;

/// The demo's channel id. The leading `C` makes it channel-like, so
/// mention detection is in play.
const CHANNEL: &str = "C1";

// ============================================================================
// Responder
// ============================================================================

/// Prints outgoing messages to the terminal instead of a chat backend.
struct Terminal;

#[async_trait]
impl Responder for Terminal {
    async fn say(&self, channel: &str, text: &str) -> Result<(), SendError> {
        println!("[{channel}] bot: {text}");
        Ok(())
    }
}

// ============================================================================
// Plugins
// ============================================================================

/// Echoes back whatever is said directly to the bot.
struct EchoBack {
    responder: BoxedResponder,
}

impl EchoBack {
    fn new(responder: BoxedResponder) -> Self {
        Self { responder }
    }

    async fn repeat(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        let Some(channel) = ctx.channel() else {
            return Ok(());
        };
        if let Some(text) = ctx.arg("text") {
            self.responder.say(channel, text).await?;
        }
        Ok(())
    }
}

impl Plugin for EchoBack {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("echo").with_summary("Echoing things back")
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
        vec![
            ActionDecl::respond_to("repeat", r"^echo (?P<text>.+)$", bind(&self, Self::repeat))
                .with_help("echo <text>", "Echo text back at you"),
        ]
    }
}

/// Says it is still alive once a minute.
struct Heartbeat {
    responder: BoxedResponder,
}

impl Heartbeat {
    fn new(responder: BoxedResponder) -> Self {
        Self { responder }
    }

    async fn beat(self: Arc<Self>, _ctx: ActionContext) -> Result<(), HandlerError> {
        self.responder.say(CHANNEL, "still here").await?;
        Ok(())
    }
}

impl Plugin for Heartbeat {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("heartbeat").with_summary("Liveness heartbeat")
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
        vec![ActionDecl::schedule(
            "beat",
            Trigger::cron("* * * * *"),
            bind(&self, Self::beat),
        )]
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let responder: BoxedResponder = Arc::new(Terminal);

    let runtime = MachinaRuntime::builder()
        .responder(Arc::clone(&responder))
        .plugin(Arc::new(EchoBack::new(Arc::clone(&responder))))
        .plugin(Arc::new(Heartbeat::new(Arc::clone(&responder))))
        .build()
        .await?;

    let events = runtime.sender();
    runtime.start().await?;

    println!("Type a line to chat. Prefix with \"machina:\" to address the bot; Ctrl+D quits.");
    println!("Try: ping");
    println!("Try: machina: help");
    println!("Try: machina: echo good morning");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        events.send(Event::message(CHANNEL, line)).await?;
    }

    runtime.stop().await?;
    Ok(())
}
