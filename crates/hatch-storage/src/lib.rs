// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Hatch messaging relay.
//!
//! WAL-mode SQLite with embedded migrations, one `tokio-rusqlite` connection
//! per handle, and the three storage components: the Participant Directory
//! ([`queries::participants`]), the Conversation Resolver
//! ([`queries::conversations`]), and the Message Store ([`queries::messages`]).

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
mod writer;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use migrations::AppliedMigration;
