use crate::domain::{CurrencyCode, CurrencyRate};
use crate::ports::CurrencyStore;
use async_trait::async_trait;
use shared::{Error, Result};
use std::path::Path;

const CURRENCIES_TREE: &str = "currencies";

/// Sled-backed durable store, one JSON row per currency code
#[derive(Clone)]
pub struct SledCurrencyStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledCurrencyStore {
    /// Open (or create) the store at `path`
    /// Creates the parent directory if it doesn't exist
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open Sled database: {}", e)))?;
        Self::from_db(db)
    }

    /// Use an already opened database, so other trees can share the same file
    pub fn from_db(db: sled::Db) -> Result<Self> {
        let tree = db
            .open_tree(CURRENCIES_TREE)
            .map_err(|e| Error::Storage(format!("Failed to open currencies tree: {}", e)))?;

        Ok(Self { db, tree })
    }

    /// Flush pending writes to disk, used on shutdown
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| Error::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }

    fn encode(rate: &CurrencyRate) -> Result<Vec<u8>> {
        serde_json::to_vec(rate)
            .map_err(|e| Error::Internal(format!("Failed to serialize currency: {}", e)))
    }

    fn decode(bytes: &[u8]) -> Result<CurrencyRate> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Internal(format!("Failed to deserialize currency: {}", e)))
    }
}

#[async_trait]
impl CurrencyStore for SledCurrencyStore {
    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<CurrencyRate>> {
        let value = self
            .tree
            .get(code.as_str().as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to get currency: {}", e)))?;

        value.map(|bytes| Self::decode(&bytes)).transpose()
    }

    async fn create(&self, rate: CurrencyRate) -> Result<()> {
        let value = Self::encode(&rate)?;

        // Insert only if absent so concurrent creators cannot overwrite each other
        let swapped = self
            .tree
            .compare_and_swap(
                rate.code.as_str().as_bytes(),
                None as Option<&[u8]>,
                Some(value),
            )
            .map_err(|e| Error::Storage(format!("Failed to create currency: {}", e)))?;

        match swapped {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::AlreadyExists(rate.code.to_string())),
        }
    }

    async fn update(&self, rate: CurrencyRate) -> Result<()> {
        let key = rate.code.as_str().as_bytes();

        loop {
            let current = self
                .tree
                .get(key)
                .map_err(|e| Error::Storage(format!("Failed to get currency: {}", e)))?
                .ok_or_else(|| Error::CurrencyNotFound(rate.code.to_string()))?;

            let existing = Self::decode(&current)?;
            let row = CurrencyRate {
                created_at: existing.created_at,
                created_by: existing.created_by,
                updated_at: rate.updated_at.max(existing.updated_at),
                ..rate.clone()
            };

            let swapped = self
                .tree
                .compare_and_swap(key, Some(current), Some(Self::encode(&row)?))
                .map_err(|e| Error::Storage(format!("Failed to update currency: {}", e)))?;

            // Lost a race with another writer: re-read and apply on top of it
            if swapped.is_ok() {
                return Ok(());
            }
        }
    }

    async fn delete(&self, code: &CurrencyCode) -> Result<()> {
        let removed = self
            .tree
            .remove(code.as_str().as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to delete currency: {}", e)))?;

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::CurrencyNotFound(code.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::parse(raw).unwrap()
    }

    fn open_store() -> (SledCurrencyStore, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledCurrencyStore::new(temp_dir.path().join("currencies.sled")).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_sled_store_create_and_get() {
        let (store, _dir) = open_store();
        let row = CurrencyRate::new(code("EUR"), 0.85, "admin").unwrap();

        store.create(row.clone()).await.unwrap();

        let fetched = store.get_by_code(&code("EUR")).await.unwrap();
        assert_eq!(fetched, Some(row));
        assert!(store.get_by_code(&code("GBP")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sled_store_create_twice_fails() {
        let (store, _dir) = open_store();
        store
            .create(CurrencyRate::new(code("EUR"), 0.85, "admin").unwrap())
            .await
            .unwrap();

        let second = store
            .create(CurrencyRate::new(code("EUR"), 0.99, "admin").unwrap())
            .await;

        assert!(matches!(second, Err(Error::AlreadyExists(c)) if c == "EUR"));
        let stored = store.get_by_code(&code("EUR")).await.unwrap().unwrap();
        assert_eq!(stored.rate, 0.85);
    }

    #[tokio::test]
    async fn test_sled_store_update_keeps_creation_metadata() {
        let (store, _dir) = open_store();
        let row = CurrencyRate::new(code("USD"), 1.0, "admin").unwrap();
        store.create(row.clone()).await.unwrap();

        let later = Utc::now() + Duration::seconds(5);
        let mut changed = row.with_rate(1.02, "bob", later).unwrap();
        changed.created_by = "someone-else".to_string();
        store.update(changed).await.unwrap();

        let stored = store.get_by_code(&code("USD")).await.unwrap().unwrap();
        assert_eq!(stored.rate, 1.02);
        assert_eq!(stored.updated_by, "bob");
        assert_eq!(stored.created_by, "admin");
        assert_eq!(stored.updated_at, later);
    }

    #[tokio::test]
    async fn test_sled_store_update_missing_fails() {
        let (store, _dir) = open_store();
        let row = CurrencyRate::new(code("JPY"), 150.0, "admin").unwrap();

        let result = store.update(row).await;

        assert!(matches!(result, Err(Error::CurrencyNotFound(c)) if c == "JPY"));
        assert!(store.get_by_code(&code("JPY")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sled_store_delete() {
        let (store, _dir) = open_store();
        store
            .create(CurrencyRate::new(code("BRL"), 5.0, "admin").unwrap())
            .await
            .unwrap();

        store.delete(&code("BRL")).await.unwrap();

        assert!(store.get_by_code(&code("BRL")).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&code("BRL")).await,
            Err(Error::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sled_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("currencies.sled");

        {
            let store = SledCurrencyStore::new(&path).unwrap();
            store
                .create(CurrencyRate::new(code("CAD"), 1.36, "admin").unwrap())
                .await
                .unwrap();
            store.flush().await.unwrap();
        }

        let reopened = SledCurrencyStore::new(&path).unwrap();
        let stored = reopened.get_by_code(&code("CAD")).await.unwrap().unwrap();
        assert_eq!(stored.rate, 1.36);
    }
}
