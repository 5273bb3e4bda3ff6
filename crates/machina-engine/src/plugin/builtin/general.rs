//! General-purpose builtins: the ping-pong health check and greetings.

use serde_json::Value;

use std::sync::Arc;

use machina_core::action::ActionDecl;
use machina_core::error::HandlerError;
use machina_core::handler::{ActionContext, bind};
use machina_core::responder::BoxedResponder;

use crate::plugin::{Plugin, PluginInfo};

/// Plays ping pong: answers "ping" with "pong" and the other way around.
pub struct PingPong {
    responder: BoxedResponder,
}

impl PingPong {
    /// Builtin replying through `responder`.
    pub fn new(responder: BoxedResponder) -> Self {
        Self { responder }
    }

    async fn ping(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        tracing::debug!("ping received, serving the ball");
        self.reply(&ctx, "pong").await
    }

    async fn pong(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        tracing::debug!("pong received, returning the ball");
        self.reply(&ctx, "ping").await
    }

    async fn reply(&self, ctx: &ActionContext, text: &str) -> Result<(), HandlerError> {
        let Some(channel) = ctx.channel() else {
            return Ok(());
        };
        self.responder.say(channel, text).await?;
        Ok(())
    }
}

impl Plugin for PingPong {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("ping-pong").with_summary("Playing ping pong")
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
        vec![
            ActionDecl::listen_to("ping", r"^ping$", bind(&self, Self::ping))
                .with_help("ping", "Serve the ball"),
            ActionDecl::listen_to("pong", r"^pong$", bind(&self, Self::pong))
                .with_help("pong", "Return the ball"),
        ]
    }
}

/// Greets whoever greets the bot.
pub struct Hello {
    responder: BoxedResponder,
}

impl Hello {
    /// Builtin replying through `responder`.
    pub fn new(responder: BoxedResponder) -> Self {
        Self { responder }
    }

    async fn greet(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        let Some(channel) = ctx.channel() else {
            return Ok(());
        };
        let greeting = capitalize(ctx.arg("greeting").unwrap_or("hello"));
        let sender = ctx
            .event()
            .and_then(|event| event.extra.get("user"))
            .and_then(Value::as_str);
        let reply = match sender {
            Some(user) => format!("{greeting}, <@{user}>!"),
            None => format!("{greeting}!"),
        };
        self.responder.say(channel, &reply).await?;
        Ok(())
    }
}

impl Plugin for Hello {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("hello").with_summary("Greetings")
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
        vec![
            ActionDecl::respond_to("greet", r"^(?P<greeting>hi|hello)", bind(&self, Self::greet))
                .with_help("hi/hello", "Say hello to the bot"),
        ]
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
