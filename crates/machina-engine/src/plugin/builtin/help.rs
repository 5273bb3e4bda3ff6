//! The help builtin: renders the persisted help index on request.

use std::sync::Arc;

use machina_core::action::ActionDecl;
use machina_core::error::HandlerError;
use machina_core::handler::{ActionContext, bind};
use machina_core::help::{HelpIndex, HelpStore};
use machina_core::responder::BoxedResponder;

use crate::plugin::{Plugin, PluginInfo};

/// Answers "help" with the human view and "robot help" with the literal
/// phrases the bot reacts to.
pub struct Help {
    responder: BoxedResponder,
    store: Arc<dyn HelpStore>,
}

impl Help {
    /// Builtin reading from `store` and replying through `responder`.
    pub fn new(responder: BoxedResponder, store: Arc<dyn HelpStore>) -> Self {
        Self { responder, store }
    }

    async fn human(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        let Some(channel) = ctx.channel() else {
            return Ok(());
        };
        let text = match self.store.load().await? {
            Some(index) => render_human(&index),
            None => "No help has been indexed yet.".to_string(),
        };
        self.responder.say(channel, &text).await?;
        Ok(())
    }

    async fn robot(self: Arc<Self>, ctx: ActionContext) -> Result<(), HandlerError> {
        let Some(channel) = ctx.channel() else {
            return Ok(());
        };
        let text = match self.store.load().await? {
            Some(index) => render_robot(&index),
            None => "No help has been indexed yet.".to_string(),
        };
        self.responder.say(channel, &text).await?;
        Ok(())
    }
}

impl Plugin for Help {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("help").with_summary("Getting help")
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
        vec![
            ActionDecl::respond_to("help", r"^help$", bind(&self, Self::human))
                .with_help("help", "Show what every plugin can do"),
            ActionDecl::respond_to("robot_help", r"^robot help$", bind(&self, Self::robot))
                .with_help("robot help", "Show the exact phrases I react to"),
        ]
    }
}

fn render_human(index: &HelpIndex) -> String {
    let mut out = String::from("This is what I can help you with:\n");
    for (summary, commands) in index.human.iter() {
        out.push('\n');
        out.push_str(summary);
        out.push('\n');
        for (command, description) in commands.iter() {
            out.push_str(&format!("  {command}: {description}\n"));
        }
    }
    out
}

fn render_robot(index: &HelpIndex) -> String {
    let mut out = String::from("I react to:\n");
    for (summary, usages) in index.robot.iter() {
        out.push('\n');
        out.push_str(summary);
        out.push('\n');
        for usage in usages {
            out.push_str(&format!("  {usage}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use machina_core::event::Event;
    use machina_core::handler::Bindings;
    use machina_core::help::MemoryHelpStore;
    use machina_core::responder::{Responder, SendError};

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Responder for Recording {
        async fn say(&self, channel: &str, text: &str) -> Result<(), SendError> {
            self.sent.lock().push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }

    async fn request(plugin: &Arc<Help>, action: usize, text: &str) {
        let decls = Arc::clone(plugin).actions();
        let ctx = ActionContext::for_event(Arc::new(Event::message("D1", text)), Bindings::new());
        decls[action].handler.clone()(ctx).await.unwrap();
    }

    #[tokio::test]
    async fn renders_the_stored_index_in_order() {
        let store = Arc::new(MemoryHelpStore::new());
        let mut index = HelpIndex::new();
        index.seed_owner("General commands");
        index.add_human("General commands", "ping", "Serve the ball");
        index.seed_owner("Quiet plugin");
        index.add_robot("General commands", "ping");
        store.store(&index).await.unwrap();

        let recording = Arc::new(Recording::default());
        let plugin = Arc::new(Help::new(
            Arc::clone(&recording) as BoxedResponder,
            store as Arc<dyn HelpStore>,
        ));

        request(&plugin, 0, "help").await;
        request(&plugin, 1, "robot help").await;

        let sent = recording.sent.lock();
        let human = &sent[0].1;
        assert!(human.starts_with("This is what I can help you with:\n"));
        assert!(human.contains("General commands\n  ping: Serve the ball\n"));
        assert!(human.contains("Quiet plugin\n"));
        assert!(
            human.find("General commands") < human.find("Quiet plugin"),
            "sections out of load order: {human}"
        );

        let robot = &sent[1].1;
        assert!(robot.starts_with("I react to:\n"));
        assert!(robot.contains("General commands\n  ping\n"));
    }

    #[tokio::test]
    async fn an_empty_store_says_so() {
        let recording = Arc::new(Recording::default());
        let plugin = Arc::new(Help::new(
            Arc::clone(&recording) as BoxedResponder,
            Arc::new(MemoryHelpStore::new()) as Arc<dyn HelpStore>,
        ));

        request(&plugin, 0, "help").await;

        assert_eq!(
            recording.sent.lock().as_slice(),
            &[("D1".into(), "No help has been indexed yet.".into())]
        );
    }
}
