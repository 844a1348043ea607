// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The layered secret encryption engine.
//!
//! Every operation is single-shot and stateless: load what it needs from the
//! store, do the cryptography on the stack, persist, return. The only shared
//! state is the immutable master key and the store handle.
//!
//! Layering: `ciphertext = AEAD(key1, layer2_nonce, AEAD(key2, layer1_nonce,
//! plaintext))`. `key1` is server-generated and wrapped under the master key,
//! so the server can rotate it unilaterally; `key2` is derived from
//! user-held fragments, so a fully compromised server still cannot peel
//! layer1.

use std::sync::Arc;

use keyfold_core::{
    Enrollment, KeyMaterialStore, KeyfoldError, NewSecretRecord, NewUserKeyMaterial,
    RewrappedSecret, SecretMeta, UserKeyRecord,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY1_LEN};
use crate::kdf::{self, Key2};
use crate::master_key::MasterKey;
use crate::verifier;

/// The vault engine. Cheap to share behind an `Arc`; all methods take `&self`.
pub struct VaultEngine {
    master_key: MasterKey,
    store: Arc<dyn KeyMaterialStore>,
    kdf_iterations: u32,
}

impl std::fmt::Debug for VaultEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultEngine")
            .field("master_key", &"[redacted]")
            .field("kdf_iterations", &self.kdf_iterations)
            .finish_non_exhaustive()
    }
}

impl VaultEngine {
    pub fn new(
        master_key: MasterKey,
        store: Arc<dyn KeyMaterialStore>,
        kdf_iterations: u32,
    ) -> Self {
        Self {
            master_key,
            store,
            kdf_iterations,
        }
    }

    /// Enroll a user: generate key1 and the key2 salt, derive key2 from the
    /// master password, and persist the key material atomically with the
    /// identity row.
    ///
    /// The returned [`Enrollment`] carries the only copy of the code fragment
    /// that will ever exist server-side -- it is never persisted.
    pub async fn create_user(
        &self,
        name: &str,
        master_password: &SecretString,
    ) -> Result<Enrollment, KeyfoldError> {
        let key1 = Zeroizing::new(crypto::generate_key1()?);
        let key2_salt = crypto::generate_salt()?;

        let (key1_ciphertext, key1_nonce) = crypto::seal(self.master_key.as_bytes(), &key1[..])?;

        let key2 = kdf::derive(
            master_password.expose_secret().as_bytes(),
            &key2_salt,
            self.kdf_iterations,
        )?;
        let key2_verifier = verifier::compute(&key2, &self.master_key)?;
        let (session_code, code) = kdf::split(&key2);

        let user_id = self
            .store
            .create_user(
                name,
                &NewUserKeyMaterial {
                    key1_ciphertext,
                    key1_nonce,
                    key2_salt,
                    key2_verifier,
                },
            )
            .await?;

        info!(user_id, "user enrolled");
        Ok(Enrollment {
            user_id,
            session_code,
            code,
        })
    }

    /// Verify reconstructed fragments against the stored verifier and return
    /// the reassembled key2. This is the login primitive.
    pub async fn verify_fragments(
        &self,
        user_id: i64,
        session_code: &str,
        code: &str,
    ) -> Result<Key2, KeyfoldError> {
        let record = self.load_key_record(user_id).await?;
        let key2 = Key2::from_fragments(session_code, code)?;
        if !verifier::verify(&key2, &self.master_key, &record.key2_verifier)? {
            return Err(KeyfoldError::InvalidKey2);
        }
        Ok(key2)
    }

    /// Encrypt and store a secret under both layers.
    ///
    /// The verifier check runs before key1 is ever decrypted, so a wrong key2
    /// fails precisely and early.
    pub async fn save_secret(
        &self,
        user_id: i64,
        name: &str,
        key2: &Key2,
        plaintext: &[u8],
    ) -> Result<i64, KeyfoldError> {
        let record = self.load_key_record(user_id).await?;

        if !verifier::verify(key2, &self.master_key, &record.key2_verifier)? {
            return Err(KeyfoldError::InvalidKey2);
        }

        let key1 = self.unwrap_key1(&record)?;

        let (layer1, layer1_nonce) = crypto::seal(key2.as_bytes(), plaintext)?;
        let (layer2, layer2_nonce) = crypto::seal(&key1[..], &layer1)?;

        let secret_id = self
            .store
            .insert_secret(&NewSecretRecord {
                user_id,
                name: name.to_string(),
                ciphertext: layer2,
                layer1_nonce,
                layer2_nonce,
            })
            .await?;

        debug!(user_id, name = %name, "secret stored");
        Ok(secret_id)
    }

    /// Load, peel, and return a secret's plaintext.
    ///
    /// The explicit verifier check runs here too, for precise internal
    /// diagnostics; the AEAD tag on layer1 would reject a wrong key2 anyway,
    /// and both paths surface the same authentication failure.
    pub async fn retrieve_secret(
        &self,
        user_id: i64,
        name: &str,
        key2: &Key2,
    ) -> Result<Vec<u8>, KeyfoldError> {
        let secret = self
            .store
            .get_secret(user_id, name)
            .await?
            .ok_or_else(|| KeyfoldError::NotFound(format!("secret \"{name}\"")))?;
        let record = self.load_key_record(user_id).await?;

        if !verifier::verify(key2, &self.master_key, &record.key2_verifier)? {
            return Err(KeyfoldError::InvalidKey2);
        }

        let key1 = self.unwrap_key1(&record)?;

        let layer1 = Zeroizing::new(crypto::open(
            &key1[..],
            &secret.layer2_nonce,
            &secret.ciphertext,
        )?);
        let plaintext = crypto::open(key2.as_bytes(), &secret.layer1_nonce, &layer1)?;

        debug!(user_id, name = %name, "secret retrieved");
        Ok(plaintext)
    }

    /// List secret metadata for a user. Never touches encrypted material.
    pub async fn list_secrets(&self, user_id: i64) -> Result<Vec<SecretMeta>, KeyfoldError> {
        self.store.list_secrets(user_id).await
    }

    /// Rotate a user's key1: re-encrypt every secret's layer2 under a fresh
    /// key1 and re-wrap that key1 under the master key, committed as one
    /// transaction by the store. Layer1 (key2) material is untouched, so no
    /// user interaction is needed.
    pub async fn rotate_key1(&self, user_id: i64) -> Result<(), KeyfoldError> {
        let record = self.load_key_record(user_id).await?;
        let old_key1 = self.unwrap_key1(&record)?;
        let new_key1 = Zeroizing::new(crypto::generate_key1()?);

        let secrets = self.store.list_secret_records(user_id).await?;
        let mut rewrapped = Vec::with_capacity(secrets.len());
        for secret in &secrets {
            let layer1 = Zeroizing::new(crypto::open(
                &old_key1[..],
                &secret.layer2_nonce,
                &secret.ciphertext,
            )?);
            let (ciphertext, layer2_nonce) = crypto::seal(&new_key1[..], &layer1)?;
            rewrapped.push(RewrappedSecret {
                id: secret.id,
                ciphertext,
                layer2_nonce,
            });
        }

        let (key1_ciphertext, key1_nonce) =
            crypto::seal(self.master_key.as_bytes(), &new_key1[..])?;
        self.store
            .rewrap_user_secrets(user_id, key1_ciphertext, key1_nonce, rewrapped)
            .await?;

        info!(user_id, count = secrets.len(), "key1 rotated");
        Ok(())
    }

    async fn load_key_record(&self, user_id: i64) -> Result<UserKeyRecord, KeyfoldError> {
        self.store
            .get_user_key_record(user_id)
            .await?
            .ok_or_else(|| KeyfoldError::NotFound(format!("user {user_id}")))
    }

    fn unwrap_key1(&self, record: &UserKeyRecord) -> Result<Zeroizing<[u8; KEY1_LEN]>, KeyfoldError> {
        let raw = Zeroizing::new(crypto::open(
            self.master_key.as_bytes(),
            &record.key1_nonce,
            &record.key1_ciphertext,
        )?);
        let key1: [u8; KEY1_LEN] = raw[..]
            .try_into()
            .map_err(|_| KeyfoldError::Internal("stored key1 has unexpected length".to_string()))?;
        Ok(Zeroizing::new(key1))
    }
}
