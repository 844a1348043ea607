// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Keyfold vault.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and the
//! [`keyfold_core::KeyMaterialStore`] implementation used by the engine.

pub mod database;
pub mod migrations;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
