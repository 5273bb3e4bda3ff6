//! Mention detection and pattern matching.
//!
//! A message is either *directed* at the bot or not, and the two cases
//! route to disjoint catalogs. The grammar below recognizes three mention
//! prefixes: `<@user_id>` with an optional colon, a configured alias with
//! an optional colon, and `user_name:`. Detection is destination-aware:
//! channels and groups demand an explicit mention of this bot, while a
//! direct-message channel is directed by nature and a leading mention is
//! merely stripped.

use regex::Regex;

use machina_core::error::MalformedEvent;
use machina_core::event::Event;
use machina_core::handler::Bindings;

/// Who the bot is on the chat surface, as mention detection needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    /// Platform user id, matched against `<@user_id>` mentions.
    pub user_id: String,
    /// Login name, matched against `user_name:` prefixes.
    pub name: String,
    /// Extra names the bot answers to, with or without a colon.
    pub aliases: Vec<String>,
}

impl BotIdentity {
    /// Identity without aliases.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Adds the names the bot also answers to.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// How one message relates to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionMatch {
    /// The message is addressed to the bot.
    Directed {
        /// Message text with the mention prefix removed. `None` when the
        /// original text is already the message body (a direct message
        /// without a leading mention).
        stripped: Option<String>,
    },
    /// The message is ambient channel chatter.
    Undirected,
}

/// Compiled mention grammar plus the identity it checks against.
#[derive(Debug, Clone)]
pub struct MentionGrammar {
    identity: BotIdentity,
    pattern: Regex,
}

impl MentionGrammar {
    /// Compiles the grammar for `identity`.
    ///
    /// The alias branch sits before the `user_name:` branch so that an
    /// alias followed by a colon still resolves as an alias mention
    /// instead of being read as some other user's name.
    pub fn new(identity: BotIdentity) -> Result<Self, regex::Error> {
        let mut source = String::from(r"^(?s)(?:<@(?P<user_id>\w+)>:?");
        let aliases: Vec<String> = identity
            .aliases
            .iter()
            .filter(|alias| !alias.is_empty())
            .map(|alias| regex::escape(alias))
            .collect();
        if !aliases.is_empty() {
            source.push_str(&format!(r"|(?P<alias>{}):?", aliases.join("|")));
        }
        source.push_str(r"|(?P<user_name>\w+):) ?(?P<text>.*)$");

        Ok(Self {
            identity,
            pattern: Regex::new(&source)?,
        })
    }

    /// Classifies `event` as directed or not.
    ///
    /// Only meaningful for message events; the caller guards on the event
    /// type. A message without a channel cannot be classified and is
    /// rejected outright.
    pub fn detect(&self, event: &Event) -> Result<MentionMatch, MalformedEvent> {
        let channel = event.channel.as_deref().ok_or_else(|| MalformedEvent {
            event_type: event.event_type.clone(),
        })?;
        let captures = self.pattern.captures(event.text());

        if machina_core::event::DestinationKind::classify(channel).requires_mention() {
            let Some(caps) = captures else {
                return Ok(MentionMatch::Undirected);
            };
            let directed = caps.name("alias").is_some()
                || caps
                    .name("user_id")
                    .is_some_and(|m| m.as_str() == self.identity.user_id)
                || caps
                    .name("user_name")
                    .is_some_and(|m| m.as_str() == self.identity.name);
            if !directed {
                // A mention of somebody else is just channel chatter.
                return Ok(MentionMatch::Undirected);
            }
            let stripped = caps.name("text").map(|m| m.as_str().to_string());
            Ok(MentionMatch::Directed { stripped })
        } else {
            // Direct messages are addressed to the bot by nature. A leading
            // mention is stripped without an identity check, matching how
            // people quote the bot's name back at it in DMs.
            let stripped = captures
                .and_then(|caps| caps.name("text").map(|m| m.as_str().to_string()));
            Ok(MentionMatch::Directed { stripped })
        }
    }
}

/// Runs an action's pattern over `text` and collects its named captures.
///
/// Matching is a search, not an anchored match: patterns that want the
/// whole line anchor themselves with `^` and `$`. Unmatched optional
/// groups are omitted from the bindings.
pub fn match_pattern(pattern: &Regex, text: &str) -> Option<Bindings> {
    let caps = pattern.captures(text)?;
    let mut bindings = Bindings::new();
    for name in pattern.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            bindings.insert(name, m.as_str());
        }
    }
    Some(bindings)
}
