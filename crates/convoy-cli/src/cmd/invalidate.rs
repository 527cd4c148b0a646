use crate::output::{print_json, print_table};
use crate::session::Session;
use crate::TargetArgs;
use anyhow::Context;
use convoy_core::invalidation::{self, InvalidationRow};
use std::path::Path;

// ---------------------------------------------------------------------------
// invalidate
// ---------------------------------------------------------------------------

pub fn create(root: &Path, target: &TargetArgs, profile: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root, target.env.as_deref())?;
    let selected = invalidation::select(&session.fleet.cloudfronts, &target.services);
    if selected.is_empty() {
        println!("No CloudFront distributions selected.");
        return Ok(());
    }
    let aws = session.aws(profile)?;
    let rows = invalidation::invalidate(&aws, &selected, chrono::Utc::now())
        .context("invalidation failed")?;
    render(&rows, json, false)
}

// ---------------------------------------------------------------------------
// list-invalidations
// ---------------------------------------------------------------------------

pub fn list(root: &Path, target: &TargetArgs, profile: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root, target.env.as_deref())?;
    let selected = invalidation::select(&session.fleet.cloudfronts, &target.services);
    if selected.is_empty() {
        println!("No CloudFront distributions selected.");
        return Ok(());
    }
    let aws = session.aws(profile)?;
    let rows = invalidation::list(&aws, &selected).context("listing invalidations failed")?;
    render(&rows, json, true)
}

fn render(rows: &[InvalidationRow], json: bool, with_date: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&rows);
    }
    let mut headers = vec!["Distribution", "Pattern", "Service", "Invalidation"];
    if with_date {
        headers.push("Date");
    }
    headers.push("Status");

    let table = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                r.distribution_id.clone(),
                r.pattern.clone(),
                r.service.clone(),
                r.invalidation_id.clone(),
            ];
            if with_date {
                cells.push(
                    r.create_time
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default(),
                );
            }
            cells.push(r.status.clone());
            cells
        })
        .collect();
    print_table(&headers, table);
    Ok(())
}
