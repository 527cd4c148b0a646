//! CDN cache invalidation for the distributions declared in the fleet file.

use crate::error::Result;
use crate::platform::EdgeCache;
use crate::types::Distribution;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationRow {
    pub distribution_id: String,
    pub pattern: String,
    pub service: String,
    pub invalidation_id: String,
    pub create_time: Option<DateTime<Utc>>,
    pub status: String,
}

/// Distributions to act on: non-empty id, not ignored, and (when `services`
/// is non-empty) associated with one of them. Each entry appears once.
pub fn select<'a>(distributions: &'a [Distribution], services: &[String]) -> Vec<&'a Distribution> {
    let mut seen = HashSet::new();
    distributions
        .iter()
        .filter(|d| !d.id.trim().is_empty() && !d.ignore_deploy)
        .filter(|d| services.is_empty() || services.iter().any(|s| s.eq_ignore_ascii_case(&d.service)))
        .filter(|d| seen.insert((d.id.clone(), d.pattern.clone())))
        .collect()
}

pub fn caller_reference(now: DateTime<Utc>) -> String {
    format!("convoy-{}", now.format("%Y%m%dT%H%M%S%.3fZ"))
}

/// Create one invalidation per distribution. The first failure aborts.
pub fn invalidate(
    edge: &dyn EdgeCache,
    distributions: &[&Distribution],
    now: DateTime<Utc>,
) -> Result<Vec<InvalidationRow>> {
    let reference = caller_reference(now);
    let mut rows = Vec::with_capacity(distributions.len());
    for dist in distributions {
        let created = edge.create_invalidation(&dist.id, &dist.pattern, &reference)?;
        tracing::info!(
            distribution = %dist.id,
            pattern = %dist.pattern,
            invalidation = %created.id,
            "invalidation created"
        );
        rows.push(InvalidationRow {
            distribution_id: dist.id.clone(),
            pattern: dist.pattern.clone(),
            service: dist.service.clone(),
            invalidation_id: created.id,
            create_time: created.create_time.or(Some(now)),
            status: created.status,
        });
    }
    Ok(rows)
}

/// List invalidations of each distribution, fetching each one for its
/// paths when the summary carries none.
pub fn list(edge: &dyn EdgeCache, distributions: &[&Distribution]) -> Result<Vec<InvalidationRow>> {
    let mut rows = Vec::new();
    for dist in distributions {
        for summary in edge.list_invalidations(&dist.id)? {
            let paths = if summary.paths.is_empty() {
                edge.get_invalidation(&dist.id, &summary.id)?.paths
            } else {
                summary.paths
            };
            rows.push(InvalidationRow {
                distribution_id: dist.id.clone(),
                pattern: paths.join(", "),
                service: dist.service.clone(),
                invalidation_id: summary.id,
                create_time: summary.create_time,
                status: summary.status,
            });
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Invalidation;
    use crate::testing::FakeEdgeCache;
    use chrono::TimeZone;

    fn dist(id: &str, pattern: &str, service: &str, ignore: bool) -> Distribution {
        Distribution {
            id: id.into(),
            pattern: pattern.into(),
            ignore_deploy: ignore,
            service: service.into(),
        }
    }

    fn declared() -> Vec<Distribution> {
        vec![
            dist("E1", "/static/*", "api", false),
            dist("", "/*", "api", false),
            dist("E2", "/*", "web", true),
            dist("E3", "/*", "web", false),
            dist("E4", "/assets/*", "", false),
        ]
    }

    #[test]
    fn selection_without_filter_takes_all_usable_entries() {
        let declared = declared();
        let ids: Vec<&str> = select(&declared, &[]).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E3", "E4"]);
    }

    #[test]
    fn selection_by_service_is_case_insensitive_and_deduped() {
        let declared = declared();
        let filter = vec!["API".to_string(), "api".to_string(), "Web".to_string()];
        let ids: Vec<&str> = select(&declared, &filter).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E3"]);
    }

    #[test]
    fn invalidate_uses_one_caller_reference() {
        let edge = FakeEdgeCache::default();
        let declared = declared();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let rows = invalidate(&edge, &select(&declared, &[]), now).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].invalidation_id, "I1");
        assert_eq!(rows[0].status, "InProgress");
        let created = edge.created.borrow();
        assert!(created.iter().all(|(_, _, r)| r == "convoy-20260301T123000.000Z"));
        assert_eq!(created[0].1, "/static/*");
    }

    #[test]
    fn invalidate_failure_aborts() {
        let edge = FakeEdgeCache::default();
        edge.fail.set(true);
        let declared = declared();
        assert!(invalidate(&edge, &select(&declared, &[]), Utc::now()).is_err());
    }

    #[test]
    fn list_fetches_paths_per_invalidation() {
        let edge = FakeEdgeCache {
            existing: vec![(
                "E1".to_string(),
                Invalidation {
                    id: "INV9".into(),
                    status: "Completed".into(),
                    create_time: None,
                    paths: vec!["/static/app.js".into(), "/static/app.css".into()],
                },
            )],
            ..Default::default()
        };
        let declared = declared();
        let rows = list(&edge, &select(&declared, &["api".into()])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pattern, "/static/app.js, /static/app.css");
        assert_eq!(rows[0].service, "api");
        assert_eq!(rows[0].status, "Completed");
    }
}
