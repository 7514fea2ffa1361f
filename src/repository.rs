use crate::models::{Record, RecordId, RecordInput};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// RecordRepository
///
/// Abstract contract for the record store. Handlers only see this trait, shared as
/// `Arc<dyn RecordRepository>`, so the in-memory store can be swapped for another
/// backend without touching them.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// All current records in insertion order.
    async fn list(&self) -> Vec<Record>;
    async fn get(&self, id: RecordId) -> Option<Record>;
    /// Assigns the next identifier and appends the record.
    async fn insert(&self, input: RecordInput) -> Record;
    /// Replaces title and author of the matching record.
    async fn update(&self, id: RecordId, input: RecordInput) -> Option<Record>;
    /// Removes the matching record, keeping the relative order of the rest.
    async fn delete(&self, id: RecordId) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the record store across the application state.
pub type RepositoryState = Arc<dyn RecordRepository>;

struct Inner {
    records: Vec<Record>,
    // Monotonic: never derived from `records.len()`, so ids are not reused after a delete.
    next_id: u64,
}

/// InMemoryRepository
///
/// Owns the record collection behind a single `RwLock`. Mutations take the write lock
/// for their whole read-modify-write, so concurrent inserts can never compute the same id;
/// reads take the read lock and see a consistent snapshot.
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Builds a store pre-populated with the given records, assigning ids 1..=n.
    pub fn with_seed(seed: impl IntoIterator<Item = RecordInput>) -> Self {
        let mut records = Vec::new();
        let mut next_id = 1;
        for input in seed {
            records.push(Record {
                id: next_id,
                title: input.title,
                author: input.author,
            });
            next_id += 1;
        }
        Self {
            inner: RwLock::new(Inner { records, next_id }),
        }
    }

    /// The two records the service starts with.
    pub fn seeded() -> Self {
        Self::with_seed([
            RecordInput {
                title: "1984".to_string(),
                author: "George Orwell".to_string(),
            },
            RecordInput {
                title: "To Kill a Mockingbird".to_string(),
                author: "Harper Lee".to_string(),
            },
        ])
    }
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn list(&self) -> Vec<Record> {
        self.inner.read().await.records.clone()
    }

    async fn get(&self, id: RecordId) -> Option<Record> {
        let guard = self.inner.read().await;
        guard.records.iter().find(|r| r.id == id.get()).cloned()
    }

    async fn insert(&self, input: RecordInput) -> Record {
        let mut guard = self.inner.write().await;
        let record = Record {
            id: guard.next_id,
            title: input.title,
            author: input.author,
        };
        guard.next_id += 1;
        guard.records.push(record.clone());
        tracing::debug!(id = record.id, "record inserted");
        record
    }

    async fn update(&self, id: RecordId, input: RecordInput) -> Option<Record> {
        let mut guard = self.inner.write().await;
        let record = guard.records.iter_mut().find(|r| r.id == id.get())?;
        record.title = input.title;
        record.author = input.author;
        Some(record.clone())
    }

    async fn delete(&self, id: RecordId) -> bool {
        let mut guard = self.inner.write().await;
        match guard.records.iter().position(|r| r.id == id.get()) {
            Some(index) => {
                // `Vec::remove` shifts the tail left, preserving order.
                guard.records.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn input(title: &str, author: &str) -> RecordInput {
        RecordInput {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    fn id(raw: u64) -> RecordId {
        RecordId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn seeded_store_lists_in_insertion_order() {
        let repo = InMemoryRepository::seeded();
        let records = repo.list().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].title, "1984");
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].author, "Harper Lee");
    }

    #[tokio::test]
    async fn insert_then_get_returns_the_record() {
        let repo = InMemoryRepository::seeded();
        let created = repo.insert(input("Dune", "Frank Herbert")).await;
        assert_eq!(created.id, 3);
        assert_eq!(repo.get(id(3)).await, Some(created));
    }

    #[tokio::test]
    async fn update_keeps_id_and_replaces_fields() {
        let repo = InMemoryRepository::seeded();
        let updated = repo.update(id(1), input("Animal Farm", "Orwell")).await.unwrap();
        assert_eq!(updated.id, 1);

        let fetched = repo.get(id(1)).await.unwrap();
        assert_eq!(fetched.title, "Animal Farm");
        assert_eq!(fetched.author, "Orwell");
    }

    #[tokio::test]
    async fn update_missing_id_changes_nothing() {
        let repo = InMemoryRepository::seeded();
        let before = repo.list().await;
        assert!(repo.update(id(99), input("x", "y")).await.is_none());
        assert_eq!(repo.list().await, before);
    }

    #[tokio::test]
    async fn delete_preserves_order_of_remaining_records() {
        let repo = InMemoryRepository::seeded();
        repo.insert(input("Dune", "Frank Herbert")).await;

        assert!(repo.delete(id(2)).await);
        assert!(repo.get(id(2)).await.is_none());
        assert!(!repo.delete(id(2)).await);

        let ids: Vec<u64> = repo.list().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryRepository::seeded();
        assert!(repo.delete(id(2)).await);
        let created = repo.insert(input("Dune", "Frank Herbert")).await;
        assert_eq!(created.id, 3);
        assert!(repo.get(id(1)).await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_produce_unique_ids() {
        let repo: RepositoryState = Arc::new(InMemoryRepository::seeded());

        let mut handles = Vec::new();
        for n in 0..64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(input(&format!("title-{n}"), "anon")).await.id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 64);
        assert!(ids.iter().all(|&i| (3..=66).contains(&i)));
        assert_eq!(repo.list().await.len(), 66);
    }
}
