//! The help index: what the bot can do, in two voices.
//!
//! The human view groups command syntax and descriptions under each
//! plugin's display line; the robot view lists the literal utterances the
//! bot reacts to. Both views preserve registration order, which is why the
//! index is built on [`OrderedMap`] rather than a sorted or hashed map.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;
use std::marker::PhantomData;

use crate::error::StoreError;

// ─── OrderedMap ───────────────────────────────────────────────────────────────

/// String-keyed map that keeps insertion order.
///
/// Backed by a `Vec` of pairs: the catalogs this serves hold tens of
/// entries, and serialization must replay them in the order plugins were
/// loaded. Replacing a value keeps the key's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    /// Empty map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts `value` under `key`, returning the replaced value if the
    /// key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Value under `key`, inserting a default first if absent.
    pub fn entry(&mut self, key: impl Into<String>) -> &mut V
    where
        V: Default,
    {
        let key = key.into();
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(idx) => &mut self.0[idx].1,
            None => {
                self.0.push((key, V::default()));
                let last = self.0.len() - 1;
                &mut self.0[last].1
            }
        }
    }

    /// Value under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string-keyed map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ─── HelpIndex ────────────────────────────────────────────────────────────────

/// The assembled help catalog, rebuilt once per plugin load.
///
/// Every loaded plugin appears in both views even when it contributed no
/// help entries, so an empty section still tells users the plugin is
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelpIndex {
    /// Plugin display line, then command syntax, then description.
    pub human: OrderedMap<OrderedMap<String>>,
    /// Plugin display line, then the utterances the bot reacts to.
    pub robot: OrderedMap<Vec<String>>,
}

impl HelpIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `summary` has a section in both views.
    pub fn seed_owner(&mut self, summary: &str) {
        self.human.entry(summary);
        self.robot.entry(summary);
    }

    /// Records a human-facing entry under `summary`.
    pub fn add_human(&mut self, summary: &str, command: &str, description: &str) {
        self.human.entry(summary).insert(command, description.to_string());
    }

    /// Records an utterance the bot reacts to under `summary`.
    pub fn add_robot(&mut self, summary: &str, usage: impl Into<String>) {
        self.robot.entry(summary).push(usage.into());
    }
}

// ─── HelpStore ────────────────────────────────────────────────────────────────

/// Persistence seam for the help index.
///
/// The index is rebuilt from the registry on startup and written through
/// here so out-of-process surfaces can read it without holding the
/// registry.
#[async_trait]
pub trait HelpStore: Send + Sync {
    /// Persists `index`, replacing any earlier snapshot.
    async fn store(&self, index: &HelpIndex) -> Result<(), StoreError>;

    /// The last persisted snapshot, if any.
    async fn load(&self) -> Result<Option<HelpIndex>, StoreError>;
}

/// In-process [`HelpStore`] holding the latest snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryHelpStore {
    snapshot: RwLock<Option<HelpIndex>>,
}

impl MemoryHelpStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HelpStore for MemoryHelpStore {
    async fn store(&self, index: &HelpIndex) -> Result<(), StoreError> {
        *self.snapshot.write() = Some(index.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<HelpIndex>, StoreError> {
        Ok(self.snapshot.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_survives_replacement() {
        let mut map = OrderedMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("b", 3);

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&3));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut index = HelpIndex::new();
        index.seed_owner("Zulu commands");
        index.add_human("Zulu commands", "zap", "Zap a thing");
        index.seed_owner("Alpha commands");
        index.add_robot("Zulu commands", "@bot zap");

        let json = serde_json::to_string(&index).unwrap();
        let zulu = json.find("Zulu commands").unwrap();
        let alpha = json.find("Alpha commands").unwrap();
        assert!(zulu < alpha, "later-loaded plugin serialized first: {json}");
    }

    #[test]
    fn round_trips_through_json() {
        let mut index = HelpIndex::new();
        index.seed_owner("General commands");
        index.add_human("General commands", "ping", "Health check");
        index.add_robot("General commands", "@bot ping");

        let json = serde_json::to_string(&index).unwrap();
        let back: HelpIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn seeded_owner_is_present_with_empty_sections() {
        let mut index = HelpIndex::new();
        index.seed_owner("Silent plugin");
        assert!(index.human.get("Silent plugin").is_some_and(OrderedMap::is_empty));
        assert!(index.robot.get("Silent plugin").is_some_and(Vec::is_empty));
    }

    #[tokio::test]
    async fn memory_store_replaces_snapshots() {
        let store = MemoryHelpStore::new();
        assert!(store.load().await.unwrap().is_none());

        let mut first = HelpIndex::new();
        first.seed_owner("one");
        store.store(&first).await.unwrap();

        let mut second = HelpIndex::new();
        second.seed_owner("two");
        store.store(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(second));
    }
}
