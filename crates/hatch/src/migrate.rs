// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hatch migrate`: apply pending embedded migrations.

use std::time::Duration;

use hatch_config::model::HatchConfig;
use hatch_core::HatchError;
use hatch_storage::{AppliedMigration, Database};

/// Opens the configured database, which applies pending migrations, and
/// reports what was applied.
pub async fn run_migrate(config: &HatchConfig) -> Result<(), HatchError> {
    crate::serve::init_tracing(&config.server.log_level);

    let applied = apply(config).await?;
    println!("{}", report(&config.storage.database_path, &applied));
    Ok(())
}

async fn apply(config: &HatchConfig) -> Result<Vec<AppliedMigration>, HatchError> {
    let db = Database::open_with_busy_timeout(
        &config.storage.database_path,
        Duration::from_millis(config.storage.busy_timeout_ms),
    )
    .await?;
    let applied = db.applied_migrations().to_vec();
    db.checkpoint().await?;
    Ok(applied)
}

fn report(path: &str, applied: &[AppliedMigration]) -> String {
    if applied.is_empty() {
        return format!("{path}: schema is up to date");
    }
    let mut out = format!("{path}: applied {} migration(s)", applied.len());
    for migration in applied {
        out.push_str(&format!("\n  {migration}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatch_config::model::StorageConfig;

    fn config_at(path: &std::path::Path) -> HatchConfig {
        HatchConfig {
            storage: StorageConfig {
                database_path: path.to_string_lossy().into_owned(),
                ..StorageConfig::default()
            },
            ..HatchConfig::default()
        }
    }

    #[tokio::test]
    async fn first_run_applies_then_second_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(&dir.path().join("nested").join("hatch.db"));

        let first = apply(&config).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].version, 1);

        let second = apply(&config).await.unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn report_lists_versions() {
        let applied = vec![AppliedMigration {
            version: 1,
            name: "initial_schema".into(),
        }];
        let text = report("/var/lib/hatch.db", &applied);
        assert!(text.contains("applied 1 migration(s)"));
        assert!(text.contains("V1__initial_schema"));
        assert_eq!(report("x.db", &[]), "x.db: schema is up to date");
    }
}
