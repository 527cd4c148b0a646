//! Decide whether a service needs a new task definition revision.

use crate::env_file::TaskEnvironment;
use crate::types::{ChangeReason, DeploymentDecision, Label, Service, TaskDefinition};
use std::collections::{BTreeMap, BTreeSet};

/// Compare the desired state of `service` (plus the run's resolved image,
/// env file and force flag) with its active definition. Pure.
pub fn diff(
    service: &Service,
    active: &TaskDefinition,
    target_image: &str,
    environment: Option<&TaskEnvironment>,
    force: bool,
) -> DeploymentDecision {
    let mut reasons = BTreeSet::new();

    if target_image != active.primary_image() {
        reasons.insert(ChangeReason::ImageChanged);
    }
    if force {
        reasons.insert(ChangeReason::Forced);
    }
    if role_changed(&service.task_role_arn, active.task_role_arn.as_deref()) {
        reasons.insert(ChangeReason::TaskRoleChanged);
    }
    if role_changed(
        &service.execution_role_arn,
        active.execution_role_arn.as_deref(),
    ) {
        reasons.insert(ChangeReason::ExecutionRoleChanged);
    }
    if environment.is_some() {
        reasons.insert(ChangeReason::EnvFileApplied);
    }

    let empty = BTreeMap::new();
    let active_labels = active
        .primary_container()
        .map(|c| &c.docker_labels)
        .unwrap_or(&empty);
    if !labels_equal(&service.labels, active_labels) {
        reasons.insert(ChangeReason::LabelsChanged);
    }

    DeploymentDecision {
        needs_new_revision: !reasons.is_empty(),
        reasons,
    }
}

/// An empty desired role carries no requirement.
fn role_changed(desired: &str, active: Option<&str>) -> bool {
    !desired.is_empty() && active != Some(desired)
}

/// Set equality over `(key, value)` pairs; order is irrelevant.
pub fn labels_equal(desired: &[Label], active: &BTreeMap<String, String>) -> bool {
    let desired: BTreeSet<(&str, &str)> = desired
        .iter()
        .map(|l| (l.key.as_str(), l.value.as_str()))
        .collect();
    let active: BTreeSet<(&str, &str)> = active
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    desired == active
}

pub fn labels_to_map(labels: &[Label]) -> BTreeMap<String, String> {
    labels
        .iter()
        .map(|l| (l.key.clone(), l.value.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
