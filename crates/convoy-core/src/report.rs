//! What a run did, row by row.

use crate::types::{ChangeReason, Service, TaskDefinition};
use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// ServiceState
// ---------------------------------------------------------------------------

/// Where a service is in the reconcile sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Evaluated,
    Unchanged,
    Registering,
    Registered,
    ServiceUpdating,
    Updated,
    UpdateFailed,
    RegistryRepublishing,
    Done,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Evaluated => "evaluated",
            ServiceState::Unchanged => "unchanged",
            ServiceState::Registering => "registering",
            ServiceState::Registered => "registered",
            ServiceState::ServiceUpdating => "service_updating",
            ServiceState::Updated => "updated",
            ServiceState::UpdateFailed => "update_failed",
            ServiceState::RegistryRepublishing => "registry_republishing",
            ServiceState::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Ignored,
    NoActiveDefinition,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ignored => f.write_str("ignored"),
            SkipReason::NoActiveDefinition => f.write_str("no active task definition"),
        }
    }
}

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Outcome column of a report row. Serialized as its display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Unchanged,
    Updated,
    Ignored,
    Pushed { uri: String },
    TaggedLocally,
    ChildUpdated { child: String, parent: String },
    Error { name: String, detail: String },
}

impl StepOutcome {
    pub fn error(name: &str, detail: impl fmt::Display) -> Self {
        StepOutcome::Error {
            name: name.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StepOutcome::Error { .. })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Unchanged => f.write_str("Unchanged"),
            StepOutcome::Updated => f.write_str("Updated"),
            StepOutcome::Ignored => f.write_str("Ignored"),
            StepOutcome::Pushed { uri } => write!(f, "Pushed on {uri}"),
            StepOutcome::TaggedLocally => f.write_str("Tagged Locally (Only)"),
            StepOutcome::ChildUpdated { child, parent } => write!(f, "{child} for {parent} Updated"),
            StepOutcome::Error { name, detail } => write!(f, "Error on {name}: {detail}"),
        }
    }
}

impl Serialize for StepOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// ReportRow / DeployReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Service,
    Registry,
    ChildTask,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub kind: RowKind,
    pub name: String,
    pub previous_revision: String,
    pub new_revision: String,
    pub previous_image: String,
    pub target_image: String,
    pub status: String,
    pub running_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ServiceState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<ChangeReason>,
    pub outcome: StepOutcome,
}

impl ReportRow {
    /// A service row before its outcome is known.
    pub fn service(service: &Service, active: &TaskDefinition, target_image: &str) -> Self {
        Self {
            kind: RowKind::Service,
            name: service.name.clone(),
            previous_revision: active.revision_id(),
            new_revision: String::new(),
            previous_image: active.primary_image().to_string(),
            target_image: target_image.to_string(),
            status: service.live.status.clone(),
            running_count: Some(service.live.running_count),
            state: Some(ServiceState::Evaluated),
            reasons: Vec::new(),
            outcome: StepOutcome::Unchanged,
        }
    }

    pub fn registry(target: &str, image: &str, outcome: StepOutcome) -> Self {
        Self {
            kind: RowKind::Registry,
            name: target.to_string(),
            previous_revision: String::new(),
            new_revision: String::new(),
            previous_image: String::new(),
            target_image: image.to_string(),
            status: String::new(),
            running_count: None,
            state: None,
            reasons: Vec::new(),
            outcome,
        }
    }

    pub fn child(
        child: &str,
        previous: Option<&TaskDefinition>,
        registered: Option<&TaskDefinition>,
        image: &str,
        outcome: StepOutcome,
    ) -> Self {
        Self {
            kind: RowKind::ChildTask,
            name: child.to_string(),
            previous_revision: previous.map(|t| t.revision_id()).unwrap_or_default(),
            new_revision: registered.map(|t| t.revision_id()).unwrap_or_default(),
            previous_image: previous
                .map(|t| t.primary_image().to_string())
                .unwrap_or_default(),
            target_image: image.to_string(),
            status: String::new(),
            running_count: None,
            state: None,
            reasons: Vec::new(),
            outcome,
        }
    }

    /// Name column; secondary rows are indented under their service.
    pub fn display_name(&self) -> String {
        match self.kind {
            RowKind::Service => self.name.clone(),
            RowKind::Registry | RowKind::ChildTask => format!(" ↳ {}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedService {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeployReport {
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<SkippedService>,
}

impl DeployReport {
    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn skip(&mut self, name: &str, reason: SkipReason) {
        tracing::info!(service = %name, reason = %reason, "skipping service");
        self.skipped.push(SkippedService {
            name: name.to_string(),
            reason,
        });
    }

    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_error()).count()
    }

    pub fn service_row(&self, name: &str) -> Option<&ReportRow> {
        self.rows
            .iter()
            .find(|r| r.kind == RowKind::Service && r.name.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// StatusRow
// ---------------------------------------------------------------------------

/// One line of `convoy status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub service: String,
    pub family: String,
    pub revision: u32,
    pub image: String,
    pub status: String,
    pub running_count: i64,
}

impl StatusRow {
    /// `None` for services without a described task definition.
    pub fn from_service(service: &Service) -> Option<Self> {
        let td = service.live.task_definition.as_ref()?;
        Some(Self {
            service: service.name.clone(),
            family: td.family.clone(),
            revision: td.revision,
            image: td.primary_image().to_string(),
            status: service.live.status.clone(),
            running_count: service.live.running_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
