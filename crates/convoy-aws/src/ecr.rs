//! `Registry` over `aws ecr`.

use convoy_core::platform::{AuthorizationData, Registry, Repository};
use serde::{Deserialize, Serialize};

use crate::{AwsCli, AwsError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeRepositoriesInput<'a> {
    repository_names: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct DescribeRepositoriesOutput {
    #[serde(default)]
    repositories: Vec<Repository>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetAuthorizationTokenInput<'a> {
    registry_ids: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetAuthorizationTokenOutput {
    #[serde(default)]
    authorization_data: Vec<AuthorizationData>,
}

impl Registry for AwsCli {
    fn describe_repository(&self, name: &str) -> convoy_core::Result<Repository> {
        let out: DescribeRepositoriesOutput = self.call(
            "ecr",
            "describe-repositories",
            &DescribeRepositoriesInput {
                repository_names: [name],
            },
        )?;
        let repo = out
            .repositories
            .into_iter()
            .next()
            .ok_or(AwsError::MissingField("repositories[0]"))?;
        Ok(repo)
    }

    fn authorization_token(&self, registry_id: &str) -> convoy_core::Result<AuthorizationData> {
        let out: GetAuthorizationTokenOutput = self.call(
            "ecr",
            "get-authorization-token",
            &GetAuthorizationTokenInput {
                registry_ids: [registry_id],
            },
        )?;
        let data = out
            .authorization_data
            .into_iter()
            .next()
            .ok_or(AwsError::MissingField("authorizationData[0]"))?;
        Ok(data)
    }
}
