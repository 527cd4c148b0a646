//! `EdgeCache` over `aws cloudfront`.

use chrono::{DateTime, Utc};
use convoy_core::platform::{EdgeCache, Invalidation};
use serde::{Deserialize, Serialize};

use crate::{AwsCli, AwsError};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateInvalidationInput<'a> {
    distribution_id: &'a str,
    invalidation_batch: Batch<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Batch<'a> {
    paths: PathsInput<'a>,
    caller_reference: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PathsInput<'a> {
    quantity: usize,
    items: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionInput<'a> {
    distribution_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetInvalidationInput<'a> {
    distribution_id: &'a str,
    id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidationOutput {
    invalidation: Option<InvalidationRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListInvalidationsOutput {
    #[serde(default)]
    invalidation_list: InvalidationList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidationList {
    #[serde(default)]
    items: Vec<InvalidationRecord>,
}

/// Shared shape of `Invalidation` and `InvalidationSummary`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidationRecord {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    invalidation_batch: Option<BatchRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchRecord {
    #[serde(default)]
    paths: PathsRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PathsRecord {
    #[serde(default)]
    items: Vec<String>,
}

impl From<InvalidationRecord> for Invalidation {
    fn from(r: InvalidationRecord) -> Self {
        Invalidation {
            id: r.id,
            status: r.status,
            create_time: r.create_time,
            paths: r
                .invalidation_batch
                .map(|b| b.paths.items)
                .unwrap_or_default(),
        }
    }
}

impl InvalidationOutput {
    fn into_invalidation(self) -> Result<Invalidation, AwsError> {
        self.invalidation
            .map(Invalidation::from)
            .ok_or(AwsError::MissingField("Invalidation"))
    }
}

impl EdgeCache for AwsCli {
    fn create_invalidation(
        &self,
        distribution_id: &str,
        pattern: &str,
        caller_reference: &str,
    ) -> convoy_core::Result<Invalidation> {
        let out: InvalidationOutput = self.call(
            "cloudfront",
            "create-invalidation",
            &CreateInvalidationInput {
                distribution_id,
                invalidation_batch: Batch {
                    paths: PathsInput {
                        quantity: 1,
                        items: [pattern],
                    },
                    caller_reference,
                },
            },
        )?;
        Ok(out.into_invalidation()?)
    }

    fn list_invalidations(&self, distribution_id: &str) -> convoy_core::Result<Vec<Invalidation>> {
        let out: ListInvalidationsOutput = self.call(
            "cloudfront",
            "list-invalidations",
            &DistributionInput { distribution_id },
        )?;
        Ok(out
            .invalidation_list
            .items
            .into_iter()
            .map(Invalidation::from)
            .collect())
    }

    fn get_invalidation(&self, distribution_id: &str, id: &str) -> convoy_core::Result<Invalidation> {
        let out: InvalidationOutput = self.call(
            "cloudfront",
            "get-invalidation",
            &GetInvalidationInput { distribution_id, id },
        )?;
        Ok(out.into_invalidation()?)
    }
}
