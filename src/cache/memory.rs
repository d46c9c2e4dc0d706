use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::Cache;

/// In-process cache, used when no Redis URL is configured and in tests.
#[derive(Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, (String, Option<Instant>)>>,
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> eyre::Result<Option<String>> {
        let mut values = self.values.lock();
        let expired = match values.get(key) {
            None => return Ok(None),
            Some((_, Some(deadline))) => Instant::now() >= *deadline,
            Some((_, None)) => false,
        };
        if expired {
            values.remove(key);
            return Ok(None);
        }
        Ok(values.get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> eyre::Result<()> {
        let deadline = ttl.map(|t| Instant::now() + t);
        self.values.lock().insert(key.to_string(), (value, deadline));
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> eyre::Result<HashMap<String, String>> {
        Ok(self.hashes.lock().get(key).cloned().unwrap_or_default())
    }

    async fn hash_set(&self, key: &str, fields: Vec<(String, String)>) -> eyre::Result<()> {
        let mut hashes = self.hashes.lock();
        let hash = hashes.entry(key.to_string()).or_default();
        hash.extend(fields);
        Ok(())
    }
}
