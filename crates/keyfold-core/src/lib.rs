// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyfold credential vault.
//!
//! This crate provides the error type, domain types, and the collaborator
//! traits (`KeyMaterialStore`, `TokenCache`) implemented by the storage and
//! session crates and consumed by the encryption engine.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KeyfoldError;
pub use traits::{KeyMaterialStore, TokenCache};
pub use types::{
    Enrollment, NewSecretRecord, NewUserKeyMaterial, RewrappedSecret, SecretMeta,
    SecretRecord, UserKeyRecord, UserRecord, NONCE_LEN, SALT_LEN, VERIFIER_LEN,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        let _config = KeyfoldError::Config("test".into());
        let _duplicate = KeyfoldError::DuplicateName("alice".into());
        let _not_found = KeyfoldError::NotFound("user 1".into());
        let _invalid = KeyfoldError::InvalidKey2;
        let _decrypt = KeyfoldError::DecryptionFailed;
        let _random = KeyfoldError::RandomnessFailure;
        let _store = KeyfoldError::StoreUnavailable {
            source: Box::new(std::io::Error::other("test")),
        };
        let _cache = KeyfoldError::CacheUnavailable("test".into());
        let _unauth = KeyfoldError::Unauthenticated;
        let _internal = KeyfoldError::Internal("test".into());
    }

    #[test]
    fn traits_are_object_safe() {
        fn _assert_store(_: &dyn KeyMaterialStore) {}
        fn _assert_cache(_: &dyn TokenCache) {}
    }
}
