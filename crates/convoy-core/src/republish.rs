//! Copy a deployed image into another private registry.
//!
//! Runs after a service update: pull the image from the source registry,
//! retag it with the target repository's URI and push it with a short-lived
//! token. Each declared repository gets a report row.

use crate::error::ConvoyError;
use crate::image;
use crate::platform::{ContainerRuntime, Registry, RegistryAuth};
use crate::report::{ReportRow, StepOutcome};
use crate::types::RegistryTarget;

pub struct Republisher<'a> {
    registry: &'a dyn Registry,
    runtime: &'a dyn ContainerRuntime,
    source_auth: Option<&'a RegistryAuth>,
}

impl<'a> Republisher<'a> {
    pub fn new(
        registry: &'a dyn Registry,
        runtime: &'a dyn ContainerRuntime,
        source_auth: Option<&'a RegistryAuth>,
    ) -> Self {
        Self {
            registry,
            runtime,
            source_auth,
        }
    }

    /// Republish `image` to the repository named `target`. Every other
    /// entry of `repositories`, and an ignored match, yields `Ignored`.
    pub fn run(&self, target: &str, image: &str, repositories: &[RegistryTarget]) -> Vec<ReportRow> {
        repositories
            .iter()
            .map(|repo| {
                if !repo.name.eq_ignore_ascii_case(target) || repo.ignore_deploy {
                    return ReportRow::registry(&repo.name, "", StepOutcome::Ignored);
                }
                let (destination, outcome) = self.republish_one(image, repo);
                ReportRow::registry(&repo.name, &destination, outcome)
            })
            .collect()
    }

    fn republish_one(&self, image: &str, repo: &RegistryTarget) -> (String, StepOutcome) {
        let failed = |step: &str, e: ConvoyError| {
            let err = ConvoyError::Republish {
                target: repo.name.clone(),
                detail: format!("{step}: {e}"),
            };
            tracing::warn!(error = %err, "republish step failed");
            StepOutcome::error(&repo.name, e)
        };

        if let Err(e) = self.runtime.pull(image, self.source_auth) {
            return (String::new(), failed("pull", e));
        }
        tracing::info!(image = %image, "pulled source image");

        let (repository_name, _) = image::split_repository(&repo.repository_name);
        let repository = match self.registry.describe_repository(repository_name) {
            Ok(r) => r,
            Err(e) => return (String::new(), failed("describe repository", e)),
        };
        let destination = image::target_reference(&repository.repository_uri, &repo.repository_name);

        if let Err(e) = self.runtime.tag(image, &destination) {
            return (destination, failed("tag", e));
        }

        let pushed = self
            .registry
            .authorization_token(&repository.registry_id)
            .and_then(|data| RegistryAuth::from_authorization(&data))
            .and_then(|auth| self.runtime.push(&destination, &auth));
        match pushed {
            Ok(()) => {
                tracing::info!(image = %destination, "pushed image");
                let uri = destination.clone();
                (destination, StepOutcome::Pushed { uri })
            }
            Err(e) => {
                tracing::warn!(
                    target_repository = %repo.name,
                    image = %destination,
                    error = %e,
                    "push failed, image only tagged locally"
                );
                (destination, StepOutcome::TaggedLocally)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRegistry, FakeRuntime};

    const URI: &str = "123456789012.dkr.ecr.eu-west-1.amazonaws.com/vetted/api";

    fn targets() -> Vec<RegistryTarget> {
        vec![
            RegistryTarget {
                name: "mirror".into(),
                repository_name: "vetted/api".into(),
                provider: None,
                ignore_deploy: false,
            },
            RegistryTarget {
                name: "other".into(),
                repository_name: "vetted/other".into(),
                provider: None,
                ignore_deploy: false,
            },
        ]
    }

    #[test]
    fn pushes_to_matching_repository_with_latest() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        let runtime = FakeRuntime::default();
        let rows = Republisher::new(&registry, &runtime, None).run("MIRROR", "src/api:2", &targets());

        assert_eq!(rows.len(), 2);
        let expected = format!("{URI}:latest");
        assert_eq!(rows[0].outcome, StepOutcome::Pushed { uri: expected.clone() });
        assert_eq!(rows[1].outcome, StepOutcome::Ignored);
        assert_eq!(
            *runtime.calls.borrow(),
            vec![
                "pull src/api:2".to_string(),
                format!("tag src/api:2 {expected}"),
                format!("push {expected}"),
            ]
        );
        let auth = &runtime.pushed_with.borrow()[0];
        assert_eq!((auth.username.as_str(), auth.password.as_str()), ("AWS", "token-password"));
    }

    #[test]
    fn declared_tag_is_kept() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        let runtime = FakeRuntime::default();
        let mut repos = targets();
        repos[0].repository_name = "vetted/api:stable".into();
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &repos);
        assert_eq!(rows[0].target_image, format!("{URI}:stable"));
    }

    #[test]
    fn pull_failure_stops_pipeline() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        let runtime = FakeRuntime::default();
        runtime.fail_pull.set(true);
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &targets());

        assert!(rows[0].outcome.to_string().starts_with("Error on mirror:"));
        assert_eq!(runtime.count("tag"), 0);
        assert_eq!(runtime.count("push"), 0);
    }

    #[test]
    fn describe_failure_is_an_error_row() {
        let registry = FakeRegistry::default();
        let runtime = FakeRuntime::default();
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &targets());
        assert!(rows[0].outcome.is_error());
        assert_eq!(runtime.count("tag"), 0);
    }

    #[test]
    fn push_failure_leaves_image_tagged_locally() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        let runtime = FakeRuntime::default();
        runtime.fail_push.set(true);
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &targets());
        assert_eq!(rows[0].outcome, StepOutcome::TaggedLocally);
        assert_eq!(runtime.count("tag"), 1);
    }

    #[test]
    fn token_failure_leaves_image_tagged_locally() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        registry.fail_token.set(true);
        let runtime = FakeRuntime::default();
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &targets());
        assert_eq!(rows[0].outcome, StepOutcome::TaggedLocally);
        assert_eq!(runtime.count("push"), 0);
    }

    #[test]
    fn ignored_match_does_nothing() {
        let registry = FakeRegistry::default().with_repository("vetted/api", URI);
        let runtime = FakeRuntime::default();
        let mut repos = targets();
        repos[0].ignore_deploy = true;
        let rows = Republisher::new(&registry, &runtime, None).run("mirror", "src/api:2", &repos);
        assert!(rows.iter().all(|r| r.outcome == StepOutcome::Ignored));
        assert!(runtime.calls.borrow().is_empty());
    }
}
