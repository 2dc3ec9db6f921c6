use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;

use super::{CardRecord, WalletError};

pub const SCHEMA_VERSION: u32 = 1;

/// Receives the full serialized collection after every mutation.
pub trait PersistSink: Send {
    fn persist(&self, blob: String);
}

/// Discards every blob. For stores that are never saved.
pub struct NullSink;

impl PersistSink for NullSink {
    fn persist(&self, _blob: String) {}
}

/// Hands blobs to the background writer task.
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl PersistSink for ChannelSink {
    fn persist(&self, blob: String) {
        if self.tx.send(blob).is_err() {
            tracing::error!("Persistence writer is gone; card collection not saved");
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    cards: &'a [CardRecord],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection {
    Versioned { version: u32, cards: Vec<CardRecord> },
    Legacy(Vec<CardRecord>),
}

pub fn encode_collection(cards: &[CardRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        cards,
    })
}

/// Decodes a stored blob. Accepts the versioned envelope and the older bare
/// array form, and rejects collections that break the store's invariants.
pub fn decode_collection(blob: &str) -> Result<Vec<CardRecord>, WalletError> {
    let stored: StoredCollection =
        serde_json::from_str(blob).map_err(|e| WalletError::CorruptData(e.to_string()))?;

    let cards = match stored {
        StoredCollection::Versioned { version, cards } if version == SCHEMA_VERSION => cards,
        StoredCollection::Versioned { version, .. } => {
            return Err(WalletError::CorruptData(format!(
                "unsupported schema version {}",
                version
            )));
        }
        StoredCollection::Legacy(cards) => cards,
    };

    check_collection(&cards)?;
    Ok(cards)
}

fn check_collection(cards: &[CardRecord]) -> Result<(), WalletError> {
    let mut ids = HashSet::with_capacity(cards.len());
    for card in cards {
        if !ids.insert(card.id.as_str()) {
            return Err(WalletError::CorruptData(format!("duplicate card id {}", card.id)));
        }
        if card.last4.len() != 4 || !card.last4.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::CorruptData(format!("bad last4 on card {}", card.id)));
        }
    }

    if cards.iter().filter(|c| c.is_primary).count() > 1 {
        return Err(WalletError::CorruptData("more than one primary card".to_string()));
    }

    Ok(())
}
