use crate::output::{print_json, print_table};
use crate::session::Session;
use crate::TargetArgs;
use anyhow::Context;
use clap::Args;
use convoy_aws::DockerCli;
use convoy_core::env_file::TaskEnvironment;
use convoy_core::inventory::{self, FetchPurpose};
use convoy_core::platform::{ContainerRuntime, RegistryAuth};
use convoy_core::reconcile::{DeployOptions, Reconciler};
use convoy_core::report::DeployReport;
use convoy_core::types::Service;
use convoy_core::ConvoyError;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Deploy this image instead of each service's registry
    #[arg(short = 'c', long = "container-image")]
    pub image: Option<String>,

    /// Tag appended to the image
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Register and roll out a new revision even when nothing changed
    #[arg(long)]
    pub force: bool,

    /// Env file replacing the container environment (`_KEY` entries are secrets)
    #[arg(long = "config", value_name = "ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Login for pulling from the source registry when republishing
    #[arg(long, env = "CONVOY_DOCKER_LOGIN")]
    pub docker_login: Option<String>,

    /// Password for --docker-login
    #[arg(long, env = "CONVOY_DOCKER_PASSWORD", hide_env_values = true)]
    pub docker_password: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, args: DeployArgs, profile: Option<&str>, json: bool) -> anyhow::Result<()> {
    let environment = args
        .env_file
        .as_deref()
        .map(|path| {
            TaskEnvironment::load(path)
                .with_context(|| format!("failed to read env file {}", path.display()))
        })
        .transpose()?;
    let options = DeployOptions {
        image: args.image,
        tag: args.tag,
        force: args.force,
        environment,
    };
    options.validate()?;

    let mut session = Session::open(root, args.target.env.as_deref())?;
    let aws = session.aws(profile)?;

    let names = inventory::load(
        &aws,
        &session.fleet.ecs_cluster,
        &mut session.fleet.services,
        &args.target.services,
        FetchPurpose::Deploy,
    )
    .context("failed to fetch live service state")?;

    let source_auth = source_auth(&session, args.docker_login, args.docker_password);
    let runtime = runtime();

    let fleet = &session.fleet;
    let selected: Vec<&Service> = names.iter().filter_map(|n| fleet.service(n)).collect();
    tracing::info!(
        env = %session.env,
        cluster = %fleet.ecs_cluster,
        services = selected.len(),
        "deploying"
    );

    let mut report = DeployReport::default();
    let result = Reconciler::new(&aws, &aws, runtime.as_ref(), fleet, &options)
        .with_source_auth(source_auth.as_ref())
        .run(&selected, &mut report);

    render(&report, json)?;
    result.context("deploy aborted")?;
    Ok(())
}

fn source_auth(
    session: &Session,
    login: Option<String>,
    password: Option<String>,
) -> Option<RegistryAuth> {
    match (login, password) {
        (Some(login), Some(password)) if !login.is_empty() => {
            Some(RegistryAuth::new(login, password))
        }
        _ => session.settings.source_auth(),
    }
}

fn runtime() -> Box<dyn ContainerRuntime> {
    match DockerCli::locate() {
        Ok(docker) => Box::new(docker),
        Err(e) => Box::new(MissingRuntime(e.to_string())),
    }
}

/// Stands in for docker when it is not installed; only republish needs it,
/// and each attempt then reports the reason.
struct MissingRuntime(String);

impl MissingRuntime {
    fn fail(&self) -> convoy_core::Result<()> {
        Err(ConvoyError::Platform(self.0.clone()))
    }
}

impl ContainerRuntime for MissingRuntime {
    fn pull(&self, _reference: &str, _auth: Option<&RegistryAuth>) -> convoy_core::Result<()> {
        self.fail()
    }

    fn tag(&self, _source: &str, _target: &str) -> convoy_core::Result<()> {
        self.fail()
    }

    fn push(&self, _reference: &str, _auth: &RegistryAuth) -> convoy_core::Result<()> {
        self.fail()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(report: &DeployReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }

    if !report.rows.is_empty() {
        let rows = report
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.display_name(),
                    r.previous_revision.clone(),
                    r.new_revision.clone(),
                    r.previous_image.clone(),
                    r.target_image.clone(),
                    r.status.clone(),
                    r.running_count.map(|c| c.to_string()).unwrap_or_default(),
                    r.outcome.to_string(),
                ]
            })
            .collect();
        print_table(
            &[
                "Service",
                "Previous",
                "New",
                "Previous Image",
                "Target Image",
                "Status",
                "Running",
                "Outcome",
            ],
            rows,
        );
    }
    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.name, skipped.reason);
    }
    if report.rows.is_empty() && report.skipped.is_empty() {
        println!("Nothing deployed.");
    }
    Ok(())
}
