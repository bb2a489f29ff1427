// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write transactions.
//!
//! Every multi-statement write goes through [`with_write_tx`], which opens a
//! `BEGIN IMMEDIATE` transaction so the write lock is held from the first
//! read. Two handles racing on the same file therefore serialize instead of
//! both observing "no conversation yet".

use hatch_core::{HatchError, Stage};
use rusqlite::{Transaction, TransactionBehavior};
use tokio_util::sync::CancellationToken;

/// Run `f` inside an IMMEDIATE transaction and commit it.
///
/// Any error from `f` rolls the transaction back. If `cancel` has fired by
/// the time `f` returns, the transaction is rolled back and
/// [`HatchError::Cancelled`] returned instead.
pub(crate) fn with_write_tx<T, F>(
    conn: &mut rusqlite::Connection,
    cancel: Option<&CancellationToken>,
    f: F,
) -> Result<T, HatchError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, HatchError>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| HatchError::storage(Stage::Connection, e))?;

    // Dropping `tx` on any early return rolls back.
    let value = f(&tx)?;

    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(HatchError::Cancelled);
    }

    tx.commit()
        .map_err(|e| HatchError::storage(Stage::Store, e))?;
    Ok(value)
}
