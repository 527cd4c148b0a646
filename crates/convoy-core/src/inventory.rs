//! Live state of the fleet.
//!
//! Services are described in windows of at most [`DESCRIBE_WINDOW`] names,
//! the largest batch the control plane accepts, and the records are merged
//! back into the configured [`Service`] entries by case-insensitive name.

use crate::error::{ConvoyError, Result};
use crate::platform::{ControlPlane, ServiceDescription};
use crate::types::Service;

pub const DESCRIBE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Services flagged `ignore` are left out.
    Deploy,
    /// Every declared service is eligible.
    Status,
}

/// Names of the services to fetch, always in configured order. A non-empty
/// `filter` only narrows the selection.
pub fn select_names(
    services: &[Service],
    filter: &[String],
    purpose: FetchPurpose,
) -> Result<Vec<String>> {
    for wanted in filter {
        if !services.iter().any(|s| s.is_named(wanted)) {
            tracing::warn!(service = %wanted, "service is not declared in the fleet file");
        }
    }

    let mut names: Vec<String> = Vec::new();
    for svc in services {
        if !filter.is_empty() && !filter.iter().any(|f| svc.is_named(f)) {
            continue;
        }
        if purpose == FetchPurpose::Deploy && svc.ignore_deploy {
            if !filter.is_empty() {
                tracing::info!(service = %svc.name, "service is marked ignore, not selected");
            }
            continue;
        }
        if !names.iter().any(|n| svc.is_named(n)) {
            names.push(svc.name.clone());
        }
    }

    if names.is_empty() {
        return Err(ConvoyError::NoServicesSelected);
    }
    Ok(names)
}

/// Describe `names` window by window and write the live attributes into
/// the matching services. Returns the number of describe calls issued.
pub fn fetch_live_state(
    control_plane: &dyn ControlPlane,
    cluster: &str,
    services: &mut [Service],
    names: &[String],
) -> Result<usize> {
    if names.is_empty() {
        return Err(ConvoyError::NoServicesSelected);
    }

    let mut calls = 0;
    for window in names.chunks(DESCRIBE_WINDOW) {
        let records = control_plane.describe_services(cluster, window)?;
        calls += 1;
        tracing::debug!(
            requested = window.len(),
            returned = records.len(),
            "described services"
        );
        merge_window(services, &records);
    }
    Ok(calls)
}

fn merge_window(services: &mut [Service], records: &[ServiceDescription]) {
    if records.is_empty() {
        return;
    }
    let mut seen = vec![false; records.len()];
    let mut remaining = records.len();
    for svc in services.iter_mut() {
        let Some(idx) = records.iter().position(|r| svc.is_named(&r.service_name)) else {
            continue;
        };
        let record = &records[idx];
        svc.live.task_definition_arn = record
            .active_task_definition()
            .unwrap_or_default()
            .to_string();
        svc.live.status = record.status.clone();
        svc.live.running_count = record.running_count;
        if !seen[idx] {
            seen[idx] = true;
            remaining -= 1;
        }
        if remaining == 0 {
            break;
        }
    }
}

/// Describe the active task definition of every fetched service. Failures
/// are logged and leave the service without an active definition.
pub fn hydrate_task_definitions(control_plane: &dyn ControlPlane, services: &mut [Service]) {
    for svc in services
        .iter_mut()
        .filter(|s| !s.live.task_definition_arn.is_empty())
    {
        match control_plane.describe_task_definition(&svc.live.task_definition_arn) {
            Ok(td) => svc.live.task_definition = Some(td),
            Err(e) => tracing::warn!(
                service = %svc.name,
                task_definition = %svc.live.task_definition_arn,
                error = %e,
                "could not describe active task definition"
            ),
        }
    }
}

/// Select, fetch and hydrate in one go. Returns the selected names.
pub fn load(
    control_plane: &dyn ControlPlane,
    cluster: &str,
    services: &mut [Service],
    filter: &[String],
    purpose: FetchPurpose,
) -> Result<Vec<String>> {
    let names = select_names(services, filter, purpose)?;
    let calls = fetch_live_state(control_plane, cluster, services, &names)?;
    tracing::info!(services = names.len(), calls, "fetched live state");
    hydrate_task_definitions(control_plane, services);
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
