use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::*;

/// A single fortune. `text` is the fallback shown when no localized entry exists for `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortuneMessage {
    pub id: String,
    pub text: String,
}

impl FortuneMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Key of this fortune in the `Fortunes` string table.
    pub fn localization_key(&self) -> String {
        format!("fortune_{}", self.id)
    }
}

/// Read-only collection of fortunes loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageCatalog {
    messages: Vec<FortuneMessage>,
}

impl MessageCatalog {
    const BUNDLED: &'static str = include_str!("../data/messages.json");

    pub fn new(messages: Vec<FortuneMessage>) -> Self {
        Self { messages }
    }

    /// The catalog shipped with the game.
    pub fn bundled() -> Result<Self> {
        Self::from_json(Self::BUNDLED)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.is_empty() {
            log::warn!("Loaded an empty message catalog");
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FortuneMessage> {
        self.messages.iter().find(|message| message.id == id)
    }

    /// Draws a fortune uniformly among the ones not in `seen`, or among all of them once every
    /// fortune has been seen.
    pub fn select<R: Rng + ?Sized>(
        &self,
        seen: &BTreeSet<String>,
        rng: &mut R,
    ) -> Result<&FortuneMessage> {
        if self.messages.is_empty() {
            return Err(CookieError::EmptyCatalog);
        }

        let unseen: Vec<&FortuneMessage> = self
            .messages
            .iter()
            .filter(|message| !seen.contains(&message.id))
            .collect();

        let message = if unseen.is_empty() {
            log::debug!("All {} fortunes seen, drawing from full catalog", self.len());
            &self.messages[rng.random_range(0..self.messages.len())]
        } else {
            unseen[rng.random_range(0..unseen.len())]
        };
        Ok(message)
    }
}
