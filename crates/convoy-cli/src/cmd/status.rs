use crate::output::{print_json, print_table};
use crate::session::Session;
use crate::TargetArgs;
use anyhow::Context;
use convoy_core::inventory::{self, FetchPurpose};
use convoy_core::report::StatusRow;
use std::path::Path;

pub fn run(root: &Path, target: &TargetArgs, profile: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root, target.env.as_deref())?;
    let aws = session.aws(profile)?;

    let names = inventory::load(
        &aws,
        &session.fleet.ecs_cluster,
        &mut session.fleet.services,
        &target.services,
        FetchPurpose::Status,
    )
    .context("failed to fetch live service state")?;

    let rows: Vec<StatusRow> = names
        .iter()
        .filter_map(|n| session.fleet.service(n))
        .filter_map(StatusRow::from_service)
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No running services in '{}'.", session.env);
        return Ok(());
    }
    print_table(
        &["Service", "Family", "Revision", "Current Image", "Status", "Running"],
        rows.into_iter()
            .map(|r| {
                vec![
                    r.service,
                    r.family,
                    r.revision.to_string(),
                    r.image,
                    r.status,
                    r.running_count.to_string(),
                ]
            })
            .collect(),
    );
    Ok(())
}
