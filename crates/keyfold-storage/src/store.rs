// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`KeyMaterialStore`] trait.
//!
//! Uniqueness of `users.name` and `(secrets.user_id, secrets.name)` is
//! enforced by the schema's UNIQUE constraints, so concurrent inserts of the
//! same name resolve inside SQLite: one row wins, the loser surfaces as
//! `DuplicateName`. There is no check-then-insert anywhere in this module.

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use keyfold_core::{
    KeyMaterialStore, KeyfoldError, NewSecretRecord, NewUserKeyMaterial, RewrappedSecret,
    SecretMeta, SecretRecord, UserKeyRecord, UserRecord, NONCE_LEN, SALT_LEN, VERIFIER_LEN,
};
use keyfold_config::model::StorageConfig;

use crate::database::{map_tr_err, Database};

/// SQLite-backed key material store.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the store at the configured path, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeyfoldError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Wrap an already-open database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// True for a UNIQUE-constraint violation, which the callers surface as
/// `DuplicateName`.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(ffi_err, _)
            if ffi_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn nonce_from_vec(bytes: Vec<u8>) -> Result<[u8; NONCE_LEN], KeyfoldError> {
    bytes
        .try_into()
        .map_err(|_| KeyfoldError::Internal("corrupted nonce in store".to_string()))
}

fn salt_from_vec(bytes: Vec<u8>) -> Result<[u8; SALT_LEN], KeyfoldError> {
    bytes
        .try_into()
        .map_err(|_| KeyfoldError::Internal("corrupted salt in store".to_string()))
}

fn verifier_from_vec(bytes: Vec<u8>) -> Result<[u8; VERIFIER_LEN], KeyfoldError> {
    bytes
        .try_into()
        .map_err(|_| KeyfoldError::Internal("corrupted verifier in store".to_string()))
}

/// Raw row shapes read inside the connection thread; fixed-size conversions
/// happen on the caller side where `KeyfoldError` is available.
struct RawKeyRow {
    key1_ciphertext: Vec<u8>,
    key1_nonce: Vec<u8>,
    key2_salt: Vec<u8>,
    key2_verifier: Vec<u8>,
}

struct RawSecretRow {
    id: i64,
    name: String,
    ciphertext: Vec<u8>,
    layer1_nonce: Vec<u8>,
    layer2_nonce: Vec<u8>,
}

impl RawSecretRow {
    fn into_record(self, user_id: i64) -> Result<SecretRecord, KeyfoldError> {
        Ok(SecretRecord {
            id: self.id,
            user_id,
            name: self.name,
            ciphertext: self.ciphertext,
            layer1_nonce: nonce_from_vec(self.layer1_nonce)?,
            layer2_nonce: nonce_from_vec(self.layer2_nonce)?,
        })
    }
}

#[async_trait]
impl KeyMaterialStore for SqliteStore {
    async fn create_user(
        &self,
        name: &str,
        material: &NewUserKeyMaterial,
    ) -> Result<i64, KeyfoldError> {
        let name_owned = name.to_string();
        let material = material.clone();
        let id = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
                let result = conn.query_row(
                    "INSERT INTO users (name, key1_ciphertext, key1_nonce, key2_salt, key2_verifier)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING id",
                    params![
                        name_owned,
                        material.key1_ciphertext,
                        material.key1_nonce.to_vec(),
                        material.key2_salt.to_vec(),
                        material.key2_verifier.to_vec(),
                    ],
                    |row| row.get(0),
                );
                match result {
                    Ok(id) => Ok(Some(id)),
                    Err(e) if is_unique_violation(&e) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?
            .ok_or_else(|| KeyfoldError::DuplicateName(name.to_string()))?;

        debug!(user_id = id, "user row created");
        Ok(id)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>, KeyfoldError> {
        self.db
            .connection()
            .call(move |conn| -> Result<Option<UserRecord>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT id, name, created_at FROM users WHERE id = ?1",
                    params![user_id],
                    |row| {
                        Ok(UserRecord {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            created_at: row.get(2)?,
                        })
                    },
                );
                match result {
                    Ok(user) => Ok(Some(user)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_user_key_record(
        &self,
        user_id: i64,
    ) -> Result<Option<UserKeyRecord>, KeyfoldError> {
        let row = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<RawKeyRow>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT key1_ciphertext, key1_nonce, key2_salt, key2_verifier
                     FROM users WHERE id = ?1",
                    params![user_id],
                    |row| {
                        Ok(RawKeyRow {
                            key1_ciphertext: row.get(0)?,
                            key1_nonce: row.get(1)?,
                            key2_salt: row.get(2)?,
                            key2_verifier: row.get(3)?,
                        })
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        match row {
            Some(raw) => Ok(Some(UserKeyRecord {
                user_id,
                key1_ciphertext: raw.key1_ciphertext,
                key1_nonce: nonce_from_vec(raw.key1_nonce)?,
                key2_salt: salt_from_vec(raw.key2_salt)?,
                key2_verifier: verifier_from_vec(raw.key2_verifier)?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_secret(&self, record: &NewSecretRecord) -> Result<i64, KeyfoldError> {
        let record = record.clone();
        let name = record.name.clone();
        let id = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
                let result = conn.query_row(
                    "INSERT INTO secrets (user_id, name, ciphertext, layer1_nonce, layer2_nonce)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING id",
                    params![
                        record.user_id,
                        record.name,
                        record.ciphertext,
                        record.layer1_nonce.to_vec(),
                        record.layer2_nonce.to_vec(),
                    ],
                    |row| row.get(0),
                );
                match result {
                    Ok(id) => Ok(Some(id)),
                    Err(e) if is_unique_violation(&e) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?
            .ok_or_else(|| KeyfoldError::DuplicateName(name))?;

        debug!(secret_id = id, "secret row created");
        Ok(id)
    }

    async fn get_secret(
        &self,
        user_id: i64,
        name: &str,
    ) -> Result<Option<SecretRecord>, KeyfoldError> {
        let name = name.to_string();
        let row = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<RawSecretRow>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT id, name, ciphertext, layer1_nonce, layer2_nonce
                     FROM secrets WHERE user_id = ?1 AND name = ?2",
                    params![user_id, name],
                    |row| {
                        Ok(RawSecretRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            ciphertext: row.get(2)?,
                            layer1_nonce: row.get(3)?,
                            layer2_nonce: row.get(4)?,
                        })
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        row.map(|raw| raw.into_record(user_id)).transpose()
    }

    async fn list_secrets(&self, user_id: i64) -> Result<Vec<SecretMeta>, KeyfoldError> {
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<SecretMeta>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, name, created_at FROM secrets
                     WHERE user_id = ?1 ORDER BY name",
                )?;
                let rows = stmt.query_map(params![user_id], |row| {
                    Ok(SecretMeta {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?;
                let mut metas = Vec::new();
                for row in rows {
                    metas.push(row?);
                }
                Ok(metas)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_secret_records(
        &self,
        user_id: i64,
    ) -> Result<Vec<SecretRecord>, KeyfoldError> {
        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<RawSecretRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, name, ciphertext, layer1_nonce, layer2_nonce
                     FROM secrets WHERE user_id = ?1",
                )?;
                let rows = stmt.query_map(params![user_id], |row| {
                    Ok(RawSecretRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        ciphertext: row.get(2)?,
                        layer1_nonce: row.get(3)?,
                        layer2_nonce: row.get(4)?,
                    })
                })?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(map_tr_err)?;

        rows.into_iter()
            .map(|raw| raw.into_record(user_id))
            .collect()
    }

    async fn rewrap_user_secrets(
        &self,
        user_id: i64,
        key1_ciphertext: Vec<u8>,
        key1_nonce: [u8; NONCE_LEN],
        secrets: Vec<RewrappedSecret>,
    ) -> Result<(), KeyfoldError> {
        let count = secrets.len();
        let committed = self
            .db
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let tx = conn.transaction()?;
                let updated = tx.execute(
                    "UPDATE users SET key1_ciphertext = ?1, key1_nonce = ?2 WHERE id = ?3",
                    params![key1_ciphertext, key1_nonce.to_vec(), user_id],
                )?;
                if updated != 1 {
                    return Ok(false); // tx drops, rolling everything back
                }
                for secret in &secrets {
                    let updated = tx.execute(
                        "UPDATE secrets SET ciphertext = ?1, layer2_nonce = ?2
                         WHERE id = ?3 AND user_id = ?4",
                        params![
                            secret.ciphertext,
                            secret.layer2_nonce.to_vec(),
                            secret.id,
                            user_id
                        ],
                    )?;
                    if updated != 1 {
                        return Ok(false);
                    }
                }
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(map_tr_err)?;

        if !committed {
            return Err(KeyfoldError::NotFound(format!("user {user_id}")));
        }
        debug!(user_id, count, "user secrets rewrapped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("store.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        (store, dir)
    }

    fn material(seed: u8) -> NewUserKeyMaterial {
        NewUserKeyMaterial {
            key1_ciphertext: vec![seed; 32],
            key1_nonce: [seed; NONCE_LEN],
            key2_salt: [seed; SALT_LEN],
            key2_verifier: [seed; VERIFIER_LEN],
        }
    }

    fn secret(user_id: i64, name: &str) -> NewSecretRecord {
        NewSecretRecord {
            user_id,
            name: name.to_string(),
            ciphertext: vec![0xC0; 48],
            layer1_nonce: [1; NONCE_LEN],
            layer2_nonce: [2; NONCE_LEN],
        }
    }

    #[tokio::test]
    async fn create_user_roundtrips_key_material() {
        let (store, _dir) = open_store().await;
        let id = store.create_user("alice", &material(7)).await.unwrap();

        let user = store.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.name, "alice");
        assert!(!user.created_at.is_empty());

        let record = store.get_user_key_record(id).await.unwrap().unwrap();
        assert_eq!(record.user_id, id);
        assert_eq!(record.key1_ciphertext, vec![7; 32]);
        assert_eq!(record.key1_nonce, [7; NONCE_LEN]);
        assert_eq!(record.key2_salt, [7; SALT_LEN]);
        assert_eq!(record.key2_verifier, [7; VERIFIER_LEN]);
    }

    #[tokio::test]
    async fn duplicate_user_name_is_duplicate_name() {
        let (store, _dir) = open_store().await;
        store.create_user("alice", &material(1)).await.unwrap();

        let err = store.create_user("alice", &material(2)).await.unwrap_err();
        assert!(matches!(err, KeyfoldError::DuplicateName(name) if name == "alice"));
    }

    #[tokio::test]
    async fn unknown_user_reads_as_none() {
        let (store, _dir) = open_store().await;
        assert!(store.get_user(99).await.unwrap().is_none());
        assert!(store.get_user_key_record(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_and_get_secret() {
        let (store, _dir) = open_store().await;
        let user_id = store.create_user("alice", &material(1)).await.unwrap();

        let id = store.insert_secret(&secret(user_id, "email")).await.unwrap();
        assert!(id > 0);

        let loaded = store.get_secret(user_id, "email").await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "email");
        assert_eq!(loaded.ciphertext, vec![0xC0; 48]);
        assert_eq!(loaded.layer1_nonce, [1; NONCE_LEN]);
        assert_eq!(loaded.layer2_nonce, [2; NONCE_LEN]);

        assert!(store.get_secret(user_id, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_secret_name_is_duplicate_name() {
        let (store, _dir) = open_store().await;
        let user_id = store.create_user("alice", &material(1)).await.unwrap();

        store.insert_secret(&secret(user_id, "email")).await.unwrap();
        let err = store
            .insert_secret(&secret(user_id, "email"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyfoldError::DuplicateName(name) if name == "email"));
    }

    #[tokio::test]
    async fn same_secret_name_allowed_across_users() {
        let (store, _dir) = open_store().await;
        let alice = store.create_user("alice", &material(1)).await.unwrap();
        let bob = store.create_user("bob", &material(2)).await.unwrap();

        store.insert_secret(&secret(alice, "email")).await.unwrap();
        store.insert_secret(&secret(bob, "email")).await.unwrap();
    }

    #[tokio::test]
    async fn list_secrets_is_scoped_to_the_user() {
        let (store, _dir) = open_store().await;
        let alice = store.create_user("alice", &material(1)).await.unwrap();
        let bob = store.create_user("bob", &material(2)).await.unwrap();

        store.insert_secret(&secret(alice, "email")).await.unwrap();
        store.insert_secret(&secret(alice, "bank")).await.unwrap();
        store.insert_secret(&secret(bob, "email")).await.unwrap();

        let metas = store.list_secrets(alice).await.unwrap();
        let names: Vec<&str> = metas.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["bank", "email"]);
    }

    #[tokio::test]
    async fn rewrap_replaces_key1_and_layer2_in_one_transaction() {
        let (store, _dir) = open_store().await;
        let user_id = store.create_user("alice", &material(1)).await.unwrap();
        let s1 = store.insert_secret(&secret(user_id, "one")).await.unwrap();
        let s2 = store.insert_secret(&secret(user_id, "two")).await.unwrap();

        store
            .rewrap_user_secrets(
                user_id,
                vec![0xEE; 32],
                [9; NONCE_LEN],
                vec![
                    RewrappedSecret {
                        id: s1,
                        ciphertext: vec![0xD1; 48],
                        layer2_nonce: [3; NONCE_LEN],
                    },
                    RewrappedSecret {
                        id: s2,
                        ciphertext: vec![0xD2; 48],
                        layer2_nonce: [4; NONCE_LEN],
                    },
                ],
            )
            .await
            .unwrap();

        let record = store.get_user_key_record(user_id).await.unwrap().unwrap();
        assert_eq!(record.key1_ciphertext, vec![0xEE; 32]);
        assert_eq!(record.key1_nonce, [9; NONCE_LEN]);

        let one = store.get_secret(user_id, "one").await.unwrap().unwrap();
        assert_eq!(one.ciphertext, vec![0xD1; 48]);
        assert_eq!(one.layer2_nonce, [3; NONCE_LEN]);
        // Layer1 nonces are untouched by rotation.
        assert_eq!(one.layer1_nonce, [1; NONCE_LEN]);
    }

    #[tokio::test]
    async fn rewrap_with_stale_secret_id_rolls_back() {
        let (store, _dir) = open_store().await;
        let user_id = store.create_user("alice", &material(1)).await.unwrap();
        let s1 = store.insert_secret(&secret(user_id, "one")).await.unwrap();

        let err = store
            .rewrap_user_secrets(
                user_id,
                vec![0xEE; 32],
                [9; NONCE_LEN],
                vec![
                    RewrappedSecret {
                        id: s1,
                        ciphertext: vec![0xD1; 48],
                        layer2_nonce: [3; NONCE_LEN],
                    },
                    RewrappedSecret {
                        id: s1 + 1000, // no such row
                        ciphertext: vec![0xD2; 48],
                        layer2_nonce: [4; NONCE_LEN],
                    },
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KeyfoldError::NotFound(_)));

        // The partial update to "one" was rolled back.
        let one = store.get_secret(user_id, "one").await.unwrap().unwrap();
        assert_eq!(one.ciphertext, vec![0xC0; 48]);
        let record = store.get_user_key_record(user_id).await.unwrap().unwrap();
        assert_eq!(record.key1_ciphertext, vec![1; 32]);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_secrets() {
        let (store, _dir) = open_store().await;
        let user_id = store.create_user("alice", &material(1)).await.unwrap();
        store.insert_secret(&secret(user_id, "email")).await.unwrap();

        store
            .database()
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(store.get_secret(user_id, "email").await.unwrap().is_none());
    }
}
