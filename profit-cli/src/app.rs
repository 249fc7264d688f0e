use std::io::Write;

use anyhow::{Context, Result};
use profit_core::db::{DbConfig, RepositoryRegistry};
use profit_core::{CalculatorState, Owner, ProjectSession, SaveOutcome, compute};
use profit_db_local::LocalRepositoryFactory;
use profit_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, warn};

use crate::cli::{Cli, Command, EditArgs, ProjectsCommand};
use crate::config::AppConfig;
use crate::report::{render_json, render_projects, render_table};

/// Build a [`RepositoryRegistry`] with every backend compiled into this
/// binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(LocalRepositoryFactory));
    registry
}

/// Picks the store and owner for `user`: the configured database when a user
/// is signed in, the local store otherwise.
pub fn resolve_store(
    config: &AppConfig,
    user: Option<&str>,
) -> (DbConfig, Owner) {
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => (config.database(), Owner::SignedIn(user.to_string())),
        None => {
            let local = config.local();
            warn!(
                path = %local.connection_string,
                "no user signed in, using the local project store"
            );
            (local, Owner::Anonymous)
        }
    }
}

pub async fn open_session(
    registry: &RepositoryRegistry,
    config: &AppConfig,
    user: Option<&str>,
) -> Result<ProjectSession> {
    let (db_config, owner) = resolve_store(config, user);
    debug!(
        backend = %db_config.backend,
        owner = owner.id(),
        signed_in = owner.is_signed_in(),
        "opening project store"
    );

    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open '{}' project store", db_config.backend))?;
    let session = ProjectSession::open(repo, owner)
        .await
        .context("Failed to load projects")?;
    Ok(session)
}

/// Runs one command, writing its output to `out`.
pub async fn run(
    cli: &Cli,
    config: &AppConfig,
    registry: &RepositoryRegistry,
    out: &mut dyn Write,
) -> Result<()> {
    let user = cli.user.as_deref();

    match &cli.command {
        Command::Compute {
            project: None,
            edits,
            json,
        } => {
            let state = edits.apply_to(&CalculatorState::default());
            print_result(&state, *json, out)
        }
        Command::Compute {
            project: Some(id),
            edits,
            json,
        } => {
            let mut session = open_session(registry, config, user).await?;
            select(&mut session, id).await?;
            session.apply(|s| edits.apply_to(s));
            print_result(session.state(), *json, out)
        }
        Command::Projects(command) => {
            let mut session = open_session(registry, config, user).await?;
            run_projects(&mut session, command, out).await
        }
    }
}

async fn run_projects(
    session: &mut ProjectSession,
    command: &ProjectsCommand,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        ProjectsCommand::List { json } => {
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(session.projects())?)?;
            } else {
                write!(out, "{}", render_projects(session.projects()))?;
            }
        }
        ProjectsCommand::Create { name } => {
            let project = session.create_project(name).await?;
            writeln!(out, "Створено {} «{}»", project.id, project.name)?;
        }
        ProjectsCommand::Show { id, json } => {
            select(session, id).await?;
            if !*json {
                writeln!(out, "{}", session.project_name())?;
            }
            print_result(session.state(), *json, out)?;
        }
        ProjectsCommand::Save {
            project,
            name,
            edits,
        } => {
            if let Some(id) = project {
                select(session, id).await?;
            }
            apply_edits(session, edits);
            match session.save(name.as_deref()).await? {
                SaveOutcome::Created(project) => {
                    writeln!(out, "Створено {} «{}»", project.id, project.name)?
                }
                SaveOutcome::Updated(project) => {
                    writeln!(out, "Збережено {} «{}»", project.id, project.name)?
                }
            }
        }
        ProjectsCommand::Rename { id, name } => {
            select(session, id).await?;
            if session.rename(name).await? {
                writeln!(out, "Перейменовано {} на «{}»", id, session.project_name())?;
            } else {
                writeln!(out, "Назва не змінилась")?;
            }
        }
        ProjectsCommand::Delete { id } => {
            session
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete project {id}"))?;
            writeln!(out, "Видалено {id}")?;
        }
    }
    Ok(())
}

async fn select(
    session: &mut ProjectSession,
    id: &str,
) -> Result<()> {
    session
        .select(id)
        .await
        .with_context(|| format!("Failed to open project {id}"))
}

fn apply_edits(
    session: &mut ProjectSession,
    edits: &EditArgs,
) {
    if !edits.is_empty() {
        session.apply(|s| edits.apply_to(s));
    }
}

fn print_result(
    state: &CalculatorState,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let result = compute(state);
    if json {
        writeln!(out, "{}", render_json(&result)?)?;
    } else {
        write!(out, "{}", render_table(&result))?;
    }
    Ok(())
}
