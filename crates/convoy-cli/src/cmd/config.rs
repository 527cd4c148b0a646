use crate::output::print_json;
use crate::session::{resolve_env, Session};
use anyhow::Context;
use clap::Subcommand;
use convoy_core::config::{FleetConfig, WarnLevel};
use convoy_core::settings::Settings;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate a fleet file for common mistakes
    Validate {
        /// Environment to validate
        #[arg(short = 'e', long = "env", env = "CONVOY_ENV")]
        env: Option<String>,
    },

    /// Print the resolved fleet file
    Show {
        /// Environment to show
        #[arg(short = 'e', long = "env", env = "CONVOY_ENV")]
        env: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate { env } => validate(root, env.as_deref(), json),
        ConfigSubcommand::Show { env } => show(root, env.as_deref(), json),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, env: Option<&str>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(root, env)?;
    let warnings = session.fleet.validate();

    if json {
        let value = serde_json::json!({
            "env": session.env,
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Fleet config '{}' is valid. No warnings.", session.env);
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("fleet config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, env: Option<&str>, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load_default().context("failed to read ~/.convoy.yaml")?;
    let env = resolve_env(env, &settings)?;
    let fleet = FleetConfig::load(root, &env)
        .with_context(|| format!("failed to load fleet config for '{env}'"))?;

    if json {
        return print_json(&fleet);
    }
    println!("environment: {env}");
    println!("cluster:     {} ({})", fleet.ecs_cluster, fleet.ecs_region);
    for svc in &fleet.services {
        let mut flags = Vec::new();
        if svc.ignore_deploy {
            flags.push("ignore".to_string());
        }
        if let Some(target) = &svc.update_registry {
            flags.push(format!("republish -> {target}"));
        }
        if svc.update_child_tasks {
            flags.push("cascade".to_string());
        }
        println!("  {:<24} {:<40} {}", svc.name, svc.registry, flags.join(", "));
    }
    for child in &fleet.child_tasks {
        println!("  child {:<18} parent {}", child.name, child.parent_service);
    }
    Ok(())
}
