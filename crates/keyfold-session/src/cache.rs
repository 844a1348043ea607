// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`TokenCache`] implementation with per-entry deadlines.
//!
//! Entries expire passively: an expired entry reads as absent and is evicted
//! on the next touch of its `(key, field)` pair. Reads never extend a
//! deadline.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use keyfold_core::{KeyfoldError, TokenCache};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// DashMap-backed token cache, safe for concurrent use by all handlers.
#[derive(Default)]
pub struct MemoryTokenCache {
    entries: DashMap<(String, String), CacheEntry>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn set_if_absent(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, KeyfoldError> {
        let now = Instant::now();
        let fresh = CacheEntry {
            value: value.to_string(),
            expires_at: now + ttl,
        };
        match self.entries.entry((key.to_string(), field.to_string())) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    occupied.insert(fresh);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str, field: &str) -> Result<Option<String>, KeyfoldError> {
        let composite = (key.to_string(), field.to_string());
        if let Some(entry) = self.entries.get(&composite) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(&composite);
        }
        Ok(None)
    }
}
