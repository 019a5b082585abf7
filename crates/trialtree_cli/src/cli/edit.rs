//! Mutating commands: mkdataset, mksubject, mktrial, rm

use super::context::Context;
use super::output::print_json;
use anyhow::{Context as _, Result};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// How long `mktrial` waits for background uploads before exiting anyway
const UPLOAD_WAIT: Duration = Duration::from_secs(300);
const UPLOAD_POLL: Duration = Duration::from_millis(25);

fn report(ctx: &Context, action: &str, path: &str) -> Result<()> {
    if ctx.json {
        print_json(&json!({ "action": action, "path": path }))
    } else {
        println!("{} {}", action, path);
        Ok(())
    }
}

pub async fn mkdataset(ctx: &Context, path: &str) -> Result<()> {
    ctx.session
        .create_dataset(path)
        .await
        .with_context(|| format!("Failed to create dataset {}", path))?;
    report(ctx, "created dataset", path)
}

pub async fn mksubject(ctx: &Context, path: &str) -> Result<()> {
    ctx.session
        .create_subject(path)
        .await
        .with_context(|| format!("Failed to create subject {}", path))?;
    report(ctx, "created subject", path)
}

/// Create the trial, then stay alive until its uploads have finished.
pub async fn mktrial(
    ctx: &Context,
    subject: &str,
    name: &str,
    markers: Option<&Path>,
    grf: Option<&Path>,
) -> Result<()> {
    let trial = ctx
        .session
        .create_trial(subject, name, markers, grf)
        .await
        .with_context(|| format!("Failed to create trial {} under {}", name, subject))?;

    let state = ctx.session.view_state(subject);
    let waited = tokio::time::timeout(UPLOAD_WAIT, async {
        while state.uploads_in_flight() > 0 {
            tokio::time::sleep(UPLOAD_POLL).await;
        }
    })
    .await;
    if waited.is_err() {
        warn!(
            trial = %trial,
            pending = state.uploads_in_flight(),
            "gave up waiting for uploads"
        );
    }
    report(ctx, "created trial", &trial)
}

pub async fn rm(ctx: &Context, path: &str) -> Result<()> {
    let removed = ctx
        .session
        .delete_folder(path)
        .await
        .with_context(|| format!("Failed to delete {}", path))?;
    if ctx.json {
        print_json(&json!({ "action": "deleted", "path": path, "objects": removed }))
    } else {
        println!("deleted {} ({} objects)", path, removed);
        Ok(())
    }
}
