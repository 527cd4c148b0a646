//! Propagate a service's new image to its child task definitions.

use crate::error::{ConvoyError, Result};
use crate::platform::{ControlPlane, RegisterTaskDefinition};
use crate::report::{ReportRow, StepOutcome};
use crate::types::{ChildTask, TaskDefinition};

/// Register a new revision of every child of `parent` with `image` in its
/// first container. Children of other parents produce no row.
pub fn cascade(
    control_plane: &dyn ControlPlane,
    parent: &str,
    image: &str,
    children: &[ChildTask],
) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for child in children
        .iter()
        .filter(|c| c.parent_service.eq_ignore_ascii_case(parent))
    {
        if child.ignore_deploy {
            rows.push(ReportRow::child(&child.name, None, None, image, StepOutcome::Ignored));
            continue;
        }
        match update_child(control_plane, &child.name, image) {
            Ok((previous, registered)) => {
                tracing::info!(
                    child = %child.name,
                    parent = %parent,
                    revision = %registered.revision_id(),
                    "child task updated"
                );
                let outcome = StepOutcome::ChildUpdated {
                    child: child.name.clone(),
                    parent: parent.to_string(),
                };
                rows.push(ReportRow::child(
                    &child.name,
                    Some(&previous),
                    Some(&registered),
                    image,
                    outcome,
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "child task not updated");
                let detail = match e {
                    ConvoyError::Cascade { detail, .. } => detail,
                    other => other.to_string(),
                };
                rows.push(ReportRow::child(
                    &child.name,
                    None,
                    None,
                    image,
                    StepOutcome::error(&child.name, detail),
                ));
            }
        }
    }
    rows
}

fn update_child(
    control_plane: &dyn ControlPlane,
    family: &str,
    image: &str,
) -> Result<(TaskDefinition, TaskDefinition)> {
    let cascade_err = |detail: String| ConvoyError::Cascade {
        child: family.to_string(),
        detail,
    };

    let current = control_plane
        .describe_task_definition(family)
        .map_err(|e| cascade_err(e.to_string()))?;
    let mut request = RegisterTaskDefinition::from(&current);
    let container = request
        .container_definitions
        .first_mut()
        .ok_or_else(|| cascade_err("task definition has no containers".to_string()))?;
    container.image = image.to_string();

    let registered = control_plane
        .register_task_definition(&request)
        .map_err(|e| cascade_err(e.to_string()))?;
    Ok((current, registered))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
