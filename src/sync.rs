//! Copying staged package content into consumer projects.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use log::{error, info};
use std::path::Path;

use crate::package::dependency_slot;
use crate::runtime::Runtime;
use crate::workspace::ConsumerMatch;

/// Per-consumer outcome of a synchronization.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: Vec<ConsumerMatch>,
    pub failed: Vec<(ConsumerMatch, String)>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.copied.len() + self.failed.len()
    }
}

/// Replace `package` in every consumer's dependency slot with the content of
/// `staging_dir`.
///
/// All consumers are processed concurrently. A failure for one consumer is
/// recorded and does not affect the others.
#[tracing::instrument(skip(runtime, consumers))]
pub async fn sync_consumers<R: Runtime>(
    runtime: &R,
    staging_dir: &Path,
    package: &str,
    consumers: &[ConsumerMatch],
) -> SyncReport {
    let results = join_all(consumers.iter().map(|consumer| async move {
        let result = sync_consumer(runtime, staging_dir, package, consumer).await;
        (consumer, result)
    }))
    .await;

    let mut report = SyncReport::default();
    for (consumer, result) in results {
        match result {
            Ok(()) => report.copied.push(consumer.clone()),
            Err(e) => {
                error!(
                    "failed to copy package content folder to {}: {:#}",
                    consumer.name, e
                );
                report.failed.push((consumer.clone(), format!("{:#}", e)));
            }
        }
    }
    report
}

async fn sync_consumer<R: Runtime>(
    runtime: &R,
    staging_dir: &Path,
    package: &str,
    consumer: &ConsumerMatch,
) -> Result<()> {
    let slot = dependency_slot(&consumer.dir, package);

    // Removal is best-effort; the copy below decides success.
    if runtime.exists(&slot).await
        && let Err(e) = runtime.remove_dir_all(&slot).await
    {
        error!(
            "failed to delete old package content in {}: {:#}",
            consumer.name, e
        );
    }

    runtime
        .copy_dir_all(staging_dir, &slot)
        .await
        .with_context(|| format!("Failed to copy {:?} to {:?}", staging_dir, slot))?;

    info!("package content folder was copied to {}", consumer.name);
    Ok(())
}
