use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{db::repository::KvRepository, wallet::ChannelSink};

/// Spawns the task that writes collection blobs to `repo` under `key`.
///
/// Each blob is a full snapshot, so a backlog is collapsed to its newest
/// entry before writing. The task ends once every sink is dropped.
pub fn spawn_writer(repo: Arc<dyn KvRepository>, key: String) -> (ChannelSink, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let handle = tokio::spawn(async move {
        while let Some(mut blob) = rx.recv().await {
            while let Ok(newer) = rx.try_recv() {
                blob = newer;
            }

            match repo.save(&key, &blob).await {
                Ok(()) => tracing::debug!(bytes = blob.len(), "Card collection saved"),
                Err(e) => tracing::error!("Failed to save card collection: {:#}", e),
            }
        }
        tracing::debug!("Persistence writer stopped");
    });

    (ChannelSink::new(tx), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::TokenKey,
        db::repository::InMemoryKvRepository,
        wallet::CardStore,
    };

    const TEST_KEY: &str = "cards";

    #[tokio::test]
    async fn test_writer_saves_latest_snapshot() {
        let repo = Arc::new(InMemoryKvRepository::new());
        let (sink, handle) = spawn_writer(repo.clone(), TEST_KEY.to_string());

        let mut store = CardStore::new(TokenKey::generate()).with_sink(Box::new(sink));
        let first = store.create("4111111111111111", "12/29", "123", "#007AFF", true).unwrap();
        store.create("5500000000000004", "01/28", "456", "#34C759", false).unwrap();
        store.delete(&first.id).unwrap();
        let expected = store.serialize().unwrap();

        drop(store);
        handle.await.unwrap();

        let saved = repo.load(TEST_KEY).await.unwrap().unwrap();
        assert_eq!(saved, expected);

        let restored = CardStore::restore(&saved, TokenKey::generate()).unwrap();
        assert_eq!(restored.cards().len(), 1);
        assert_eq!(restored.cards()[0].last4, "0004");
    }
}
