// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that storage backends and delivery transports implement.

use async_trait::async_trait;

use crate::error::HatchError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for every pluggable Hatch adapter.
///
/// Provides identity, health reporting, and shutdown so the binary can
/// treat storage and transports uniformly at startup and on exit.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, HatchError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), HatchError>;
}
