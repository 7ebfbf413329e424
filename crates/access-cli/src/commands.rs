//! Command implementations
//!
//! Each command is a thin wrapper over `access-rbac` that reports progress
//! on `out` and maps the result to an exit status.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use access_rbac::resolver::ALL_ITEMS;
use access_rbac::{
    AccessResolver, Anonymous, AssignmentStore, CallerProvider, Context, FileAssignmentStore,
    FixedCaller, HierarchyStore, RbacConfig, StoreError,
};

use crate::args::{Cli, Commands};

/// Exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

/// Run the parsed command line.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<Outcome> {
    let config = RbacConfig {
        data_file: cli.data_file,
        assignment_file: cli.assignment_file,
    };

    match cli.command {
        Commands::Init => init(&config, out).await,
        Commands::Assign {
            role,
            uid,
            created_by,
        } => assign(&config, &role, &uid, created_by.as_deref(), out).await,
        Commands::Revoke { role, uid } => revoke(&config, &role, &uid, out).await,
        Commands::Empty { yes } => empty(&config, yes, out).await,
        Commands::Check {
            uid,
            permission,
            caller,
            context,
        } => check(&config, &uid, &permission, caller, &context, out).await,
        Commands::Roles => roles(&config, out),
        Commands::Items { json } => items(&config, json, out),
        Commands::Assignments { uid } => assignments(&config, &uid, out).await,
    }
}

async fn init<W: Write>(config: &RbacConfig, out: &mut W) -> Result<Outcome> {
    writeln!(out, "Creating assignment storage {}", config.assignment_file.display())?;
    match FileAssignmentStore::init(&config.assignment_file).await {
        Ok(true) => {}
        Ok(false) => writeln!(out, "Assignment storage already exists")?,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create assignment storage");
            writeln!(out, "Initialization failed: {e}")?;
        }
    }

    if !FileAssignmentStore::is_initialized(&config.assignment_file).await {
        writeln!(out, "Error: assignment storage still does not exist")?;
        return Ok(Outcome::Failure);
    }
    Ok(Outcome::Success)
}

async fn assign<W: Write>(
    config: &RbacConfig,
    role: &str,
    uid: &str,
    created_by: Option<&str>,
    out: &mut W,
) -> Result<Outcome> {
    let resolver = resolver(config, Arc::new(Anonymous)).await?;
    if resolver.get_item(role).is_none() {
        writeln!(out, "Unknown role '{role}'")?;
        return Ok(Outcome::Failure);
    }

    if !resolver.assign(uid, role, created_by).await? {
        writeln!(out, "Failed to assign role '{role}' to user '{uid}'")?;
        return Ok(Outcome::Failure);
    }
    writeln!(out, "User role assigned successfully.")?;
    Ok(Outcome::Success)
}

async fn revoke<W: Write>(config: &RbacConfig, role: &str, uid: &str, out: &mut W) -> Result<Outcome> {
    let resolver = resolver(config, Arc::new(Anonymous)).await?;
    if role != ALL_ITEMS && resolver.get_item(role).is_none() {
        writeln!(out, "Unknown role '{role}'")?;
        return Ok(Outcome::Failure);
    }

    if !resolver.revoke(uid, role).await? {
        writeln!(out, "Failed to revoke role '{role}' from user '{uid}'")?;
        return Ok(Outcome::Failure);
    }
    writeln!(out, "User role revoked successfully.")?;
    Ok(Outcome::Success)
}

async fn empty<W: Write>(config: &RbacConfig, yes: bool, out: &mut W) -> Result<Outcome> {
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(
                "This will delete all existing role and permission assignments. Are you sure to proceed?",
            )
            .default(false)
            .interact()?;
        if !confirmed {
            writeln!(out, "Cancelled.")?;
            return Ok(Outcome::Failure);
        }
    }

    let store = match FileAssignmentStore::open(&config.assignment_file).await {
        Ok(store) => store,
        Err(StoreError::NotInitialized(_)) => {
            writeln!(out, "Assignment storage does not exist. Please run `rbac init` first.")?;
            return Ok(Outcome::Failure);
        }
        Err(e) => return Err(e.into()),
    };

    writeln!(out, "Deleting existing assignments...")?;
    let removed = store.clear().await?;
    tracing::info!(removed, "Emptied assignment storage");
    writeln!(out, "{removed} assignments have been deleted")?;
    Ok(Outcome::Success)
}

async fn check<W: Write>(
    config: &RbacConfig,
    uid: &str,
    permission: &str,
    caller: Option<String>,
    entries: &[String],
    out: &mut W,
) -> Result<Outcome> {
    let context = parse_context(entries)?;
    let caller: Arc<dyn CallerProvider> = match caller {
        Some(id) => Arc::new(FixedCaller::new(id)),
        None => Arc::new(Anonymous),
    };

    let resolver = resolver(config, caller).await?;
    if resolver.can(Some(uid), permission, &context).await? {
        writeln!(out, "granted")?;
        Ok(Outcome::Success)
    } else {
        writeln!(out, "denied")?;
        Ok(Outcome::Failure)
    }
}

fn roles<W: Write>(config: &RbacConfig, out: &mut W) -> Result<Outcome> {
    let hierarchy = config.load_hierarchy()?;
    for name in hierarchy.role_names() {
        match hierarchy.get(&name).and_then(|item| item.description.as_deref()) {
            Some(descr) => writeln!(out, "{name}\t{descr}")?,
            None => writeln!(out, "{name}")?,
        }
    }
    Ok(Outcome::Success)
}

fn items<W: Write>(config: &RbacConfig, json: bool, out: &mut W) -> Result<Outcome> {
    let hierarchy = config.load_hierarchy()?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(hierarchy.all())?)?;
        return Ok(Outcome::Success);
    }

    for item in hierarchy.all() {
        writeln!(out, "{} ({})", item.name, item.kind)?;
        if !item.children.is_empty() {
            writeln!(out, "  children: {}", item.children.join(", "))?;
        }
        if !item.parents.is_empty() {
            writeln!(out, "  parents: {}", item.parents.join(", "))?;
        }
    }
    Ok(Outcome::Success)
}

async fn assignments<W: Write>(config: &RbacConfig, uid: &str, out: &mut W) -> Result<Outcome> {
    let store = open_store(&config.assignment_file).await?;
    for a in store.list(uid).await? {
        match &a.created_by {
            Some(by) => writeln!(out, "{}\t{}\tby {}", a.item_name, a.created_at.to_rfc3339(), by)?,
            None => writeln!(out, "{}\t{}", a.item_name, a.created_at.to_rfc3339())?,
        }
    }
    Ok(Outcome::Success)
}

async fn resolver(config: &RbacConfig, caller: Arc<dyn CallerProvider>) -> Result<AccessResolver> {
    let hierarchy: HierarchyStore = config
        .load_hierarchy()
        .context("Failed to load the access hierarchy")?;
    let store = open_store(&config.assignment_file).await?;
    Ok(AccessResolver::new(Arc::new(hierarchy), Arc::new(store), caller))
}

async fn open_store(path: &Path) -> Result<FileAssignmentStore> {
    match FileAssignmentStore::open(path).await {
        Ok(store) => Ok(store),
        Err(StoreError::NotInitialized(_)) => bail!(
            "Assignment storage '{}' does not exist. Please run `rbac init` first.",
            path.display()
        ),
        Err(e) => Err(e.into()),
    }
}

/// Parse `key=value` entries; values are JSON when they parse as JSON, strings otherwise.
fn parse_context(entries: &[String]) -> Result<Context> {
    let mut context = Context::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("Invalid context entry '{entry}', expected KEY=VALUE");
        };
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        context.insert(key.to_string(), value);
    }
    Ok(context)
}
