//! `ControlPlane` over `aws ecs`.

use convoy_core::platform::{ControlPlane, RegisterTaskDefinition, ServiceDescription};
use convoy_core::types::TaskDefinition;
use serde::{Deserialize, Serialize};

use crate::{AwsCli, AwsError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeServicesInput<'a> {
    cluster: &'a str,
    services: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeServicesOutput {
    #[serde(default)]
    services: Vec<ServiceDescription>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
struct Failure {
    #[serde(default)]
    arn: String,
    #[serde(default)]
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTaskDefinitionInput<'a> {
    task_definition: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDefinitionOutput {
    task_definition: Option<TaskDefinition>,
}

impl TaskDefinitionOutput {
    fn into_definition(self) -> Result<TaskDefinition, AwsError> {
        self.task_definition
            .ok_or(AwsError::MissingField("taskDefinition"))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateServiceInput<'a> {
    cluster: &'a str,
    service: &'a str,
    task_definition: &'a str,
    force_new_deployment: bool,
}

impl ControlPlane for AwsCli {
    fn describe_services(
        &self,
        cluster: &str,
        names: &[String],
    ) -> convoy_core::Result<Vec<ServiceDescription>> {
        let out: DescribeServicesOutput = self.call(
            "ecs",
            "describe-services",
            &DescribeServicesInput {
                cluster,
                services: names,
            },
        )?;
        for failure in &out.failures {
            tracing::warn!(arn = %failure.arn, reason = %failure.reason, "describe-services failure");
        }
        Ok(out.services)
    }

    fn describe_task_definition(&self, task_definition: &str) -> convoy_core::Result<TaskDefinition> {
        let out: TaskDefinitionOutput = self.call(
            "ecs",
            "describe-task-definition",
            &DescribeTaskDefinitionInput { task_definition },
        )?;
        Ok(out.into_definition()?)
    }

    fn register_task_definition(
        &self,
        request: &RegisterTaskDefinition,
    ) -> convoy_core::Result<TaskDefinition> {
        let out: TaskDefinitionOutput = self.call("ecs", "register-task-definition", request)?;
        let td = out.into_definition()?;
        tracing::info!(revision = %td.revision_id(), "registered task definition");
        Ok(td)
    }

    fn update_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &str,
        force_new_deployment: bool,
    ) -> convoy_core::Result<()> {
        let _: serde_json::Value = self.call(
            "ecs",
            "update-service",
            &UpdateServiceInput {
                cluster,
                service,
                task_definition,
                force_new_deployment,
            },
        )?;
        tracing::info!(service, task_definition, "service updated");
        Ok(())
    }
}
