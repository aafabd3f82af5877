//! Resolve an entity id to a camera position.

use anyhow::Result;
use colored::Colorize;
use guardian_core::view::ViewResolver;
use guardian_core::{Refresher, ViewDirective};
use tracing::warn;

use super::{build_refresher, print_camera};
use crate::config::Config;
use crate::error::{GuardianError, GuardianResult};

pub async fn execute(id: &str, config: &Config) -> Result<()> {
    let refresher = build_refresher(config)?;
    let outcome = refresher.refresh().await;
    if !outcome.is_applied() {
        warn!(outcome = ?outcome, "Snapshot refresh did not apply");
    }

    let kind = entity_kind(&refresher, id).await?;
    println!("{} {} ({})", "Found".green(), id.bold(), kind);

    let resolver = ViewResolver::new(config.zoom_defaults());
    let snapshot = refresher.store().get().await;
    let directive = ViewDirective::ByEntityId {
        target_id: id.to_string(),
    };
    let camera = resolver
        .resolve(&directive, snapshot.as_deref())
        .map_err(|miss| GuardianError::NotLocatable(miss.to_string()))?;
    print_camera(&camera);

    Ok(())
}

async fn entity_kind(refresher: &Refresher, id: &str) -> GuardianResult<String> {
    if refresher.store().get().await.is_none() {
        return Err(GuardianError::SnapshotUnavailable(
            "data backend unreachable".into(),
        ));
    }

    refresher
        .store()
        .find_by_id(id)
        .await
        .map(|m| m.kind.to_string())
        .ok_or_else(|| GuardianError::NotLocatable(format!("entity not found: {}", id)))
}
