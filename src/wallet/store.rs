use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    crypto::{TokenKey, derive_token, generate_card_id},
    qr::QrPayload,
    validation::validate_card_input,
};

use super::{
    CardRecord, WalletError,
    model::{bank_name, darken_color},
    persist::{NullSink, PersistSink, decode_collection, encode_collection},
};

/// What the action menu can do to its target card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuAction {
    MakePrimary,
    RemovePrimary,
    Delete,
}

/// An open action menu. `offer` is the primary toggle the menu shows;
/// delete is always available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMenu {
    pub card_id: String,
    pub offer: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlipOutcome {
    pub flipped: bool,
    pub qr: Option<QrPayload>,
}

/// Owns the ordered card collection and the selection state around it.
///
/// Every public operation either applies completely or returns an error
/// without touching state, and each successful mutation of the collection
/// hands the full serialized collection to the persist sink.
pub struct CardStore {
    cards: Vec<CardRecord>,
    current_card_id: Option<String>,
    current_action_card_id: Option<String>,
    flipped: bool,
    issued_ids: HashSet<String>,
    token_key: TokenKey,
    sink: Box<dyn PersistSink>,
}

impl CardStore {
    /// An empty store that persists nowhere until [`CardStore::with_sink`].
    pub fn new(token_key: TokenKey) -> Self {
        Self {
            cards: Vec::new(),
            current_card_id: None,
            current_action_card_id: None,
            flipped: false,
            issued_ids: HashSet::new(),
            token_key,
            sink: Box::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn PersistSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Rebuilds a store from a serialized collection. Selection starts on the
    /// primary card, else the first card.
    pub fn restore(blob: &str, token_key: TokenKey) -> Result<Self, WalletError> {
        let cards = decode_collection(blob)?;

        let mut store = Self::new(token_key);
        store.issued_ids = cards.iter().map(|c| c.id.clone()).collect();
        store.cards = cards;
        store.current_card_id = store.fallback_selection();
        Ok(store)
    }

    /// Like [`CardStore::restore`], but unreadable or missing data yields an
    /// empty store.
    pub fn restore_or_empty(blob: Option<&str>, token_key: TokenKey) -> Self {
        let Some(blob) = blob else {
            return Self::new(token_key);
        };

        match Self::restore(blob, token_key.clone()) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Discarding stored cards: {}", e);
                Self::new(token_key)
            }
        }
    }

    pub fn serialize(&self) -> serde_json::Result<String> {
        encode_collection(&self.cards)
    }

    pub fn cards(&self) -> &[CardRecord] {
        &self.cards
    }

    pub fn get(&self, id: &str) -> Option<&CardRecord> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn primary(&self) -> Option<&CardRecord> {
        self.cards.iter().find(|c| c.is_primary)
    }

    pub fn current_card_id(&self) -> Option<&str> {
        self.current_card_id.as_deref()
    }

    pub fn current_card(&self) -> Option<&CardRecord> {
        self.current_card_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn current_action_card_id(&self) -> Option<&str> {
        self.current_action_card_id.as_deref()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Adds a card built from raw form input.
    ///
    /// The new card becomes primary (and selected) when `make_primary` is set
    /// or the collection was empty.
    pub fn create(
        &mut self,
        raw_number: &str,
        raw_expiry: &str,
        raw_cvv: &str,
        color: &str,
        make_primary: bool,
    ) -> Result<CardRecord, WalletError> {
        let input = validate_card_input(raw_number, raw_expiry, raw_cvv)?;

        let created_at = Utc::now();
        let millis = created_at.timestamp_millis();
        let id = self.fresh_id(millis);
        let becomes_primary = make_primary || self.cards.is_empty();
        let token = derive_token(
            &self.token_key,
            &input.number,
            &input.expiry,
            &input.cvv,
            millis,
        );

        let record = CardRecord {
            token,
            last4: input.last4().to_string(),
            expiry: input.expiry.clone(),
            color: color.to_string(),
            color_dark: darken_color(color).to_string(),
            is_primary: becomes_primary,
            bank_name: bank_name(&input.number).to_string(),
            created_at,
            id,
        };
        // Raw number and CVV end here.
        drop(input);

        if becomes_primary {
            self.cards.iter_mut().for_each(|c| c.is_primary = false);
        }
        self.cards.push(record.clone());
        if becomes_primary || self.current_card_id.is_none() {
            self.select_unchecked(&record.id);
        }

        tracing::info!(card_id = %record.id, primary = becomes_primary, "Card added");
        self.persist();
        Ok(record)
    }

    pub fn set_primary(&mut self, id: &str) -> Result<(), WalletError> {
        let index = self.index_of(id)?;
        for (i, card) in self.cards.iter_mut().enumerate() {
            card.is_primary = i == index;
        }
        self.select_unchecked(id);

        tracing::info!(card_id = %id, "Primary card set");
        self.persist();
        Ok(())
    }

    /// Clears the primary flag on `id`. No other card is promoted, so the
    /// collection may be left without a primary.
    pub fn remove_primary(&mut self, id: &str) -> Result<(), WalletError> {
        let index = self.index_of(id)?;
        self.cards[index].is_primary = false;

        tracing::info!(card_id = %id, "Primary flag removed");
        self.persist();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), WalletError> {
        let index = self.index_of(id)?;
        self.cards.remove(index);

        if self.current_card_id.as_deref() == Some(id) {
            self.current_card_id = self.fallback_selection();
            self.flipped = false;
        }
        if self.current_action_card_id.as_deref() == Some(id) {
            self.current_action_card_id = None;
        }

        tracing::info!(card_id = %id, remaining = self.cards.len(), "Card deleted");
        self.persist();
        Ok(())
    }

    /// Changes the displayed card. Selection is not persisted.
    pub fn select(&mut self, id: &str) -> Result<(), WalletError> {
        self.index_of(id)?;
        self.select_unchecked(id);
        tracing::debug!(card_id = %id, "Card selected");
        Ok(())
    }

    /// Turns the current card over. Showing the back yields a fresh QR payload.
    pub fn toggle_flip(&mut self) -> Result<FlipOutcome, WalletError> {
        let card = self.current_card().ok_or(WalletError::NoCurrentCard)?;
        let flipped = !self.flipped;
        let qr = flipped.then(|| QrPayload::new(&card.token, &card.id, Utc::now()));

        self.flipped = flipped;
        Ok(FlipOutcome { flipped, qr })
    }

    /// Payload for the QR code on the back of `id`, stamped with the current time.
    pub fn qr_payload(&self, id: &str) -> Result<QrPayload, WalletError> {
        let card = self
            .get(id)
            .ok_or_else(|| WalletError::NotFound(id.to_string()))?;
        Ok(QrPayload::new(&card.token, &card.id, Utc::now()))
    }

    pub fn open_action_menu(&mut self, id: &str) -> Result<ActionMenu, WalletError> {
        let card = self
            .get(id)
            .ok_or_else(|| WalletError::NotFound(id.to_string()))?;
        let offer = if card.is_primary {
            MenuAction::RemovePrimary
        } else {
            MenuAction::MakePrimary
        };

        self.current_action_card_id = Some(id.to_string());
        Ok(ActionMenu {
            card_id: id.to_string(),
            offer,
        })
    }

    pub fn close_action_menu(&mut self) {
        self.current_action_card_id = None;
    }

    /// Runs `action` against the card the open menu targets, then closes the
    /// menu. A failed action also closes it.
    pub fn apply_menu_action(&mut self, action: MenuAction) -> Result<(), WalletError> {
        let id = self
            .current_action_card_id
            .clone()
            .ok_or(WalletError::NoActionMenu)?;

        let result = match action {
            MenuAction::MakePrimary => self.set_primary(&id),
            MenuAction::RemovePrimary => self.remove_primary(&id),
            MenuAction::Delete => self.delete(&id),
        };
        self.close_action_menu();
        result
    }

    fn index_of(&self, id: &str) -> Result<usize, WalletError> {
        self.cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| WalletError::NotFound(id.to_string()))
    }

    fn select_unchecked(&mut self, id: &str) {
        if self.current_card_id.as_deref() != Some(id) {
            self.current_card_id = Some(id.to_string());
            self.flipped = false;
        }
    }

    fn fallback_selection(&self) -> Option<String> {
        self.primary()
            .or_else(|| self.cards.first())
            .map(|c| c.id.clone())
    }

    /// Draws ids until one was never issued by this store. `issued_ids`
    /// covers restored, created and deleted ids for the life of the process
    /// only: deleted ids are not persisted, so after a restart a deleted id is
    /// kept from reuse by the millis prefix and random suffix alone.
    fn fresh_id(&mut self, millis: i64) -> String {
        loop {
            let id = generate_card_id(millis);
            if self.issued_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    fn persist(&self) {
        match self.serialize() {
            Ok(blob) => self.sink.persist(blob),
            Err(e) => tracing::error!("Failed to serialize cards: {}", e),
        }
    }
}
