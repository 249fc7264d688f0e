//! End-to-end runs of the `profit` commands over the local JSON store.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use pretty_assertions::assert_eq;
use profit_cli::app::{build_registry, open_session, run};
use profit_cli::cli::Cli;
use profit_cli::config::{AppConfig, LocalConfig};
use profit_core::{ExpenseId, ExpenseMode, Owner};
use rust_decimal_macros::dec;

/// A config whose local store lives in a fresh temp directory, removed on
/// drop.
struct Workspace {
    dir: PathBuf,
    config: AppConfig,
}

impl Workspace {
    fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "profit-cli-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let config = AppConfig {
            local: LocalConfig {
                path: dir.join("projects.json").to_string_lossy().into_owned(),
            },
            ..AppConfig::default()
        };
        Self { dir, config }
    }

    async fn run(
        &self,
        args: &[&str],
    ) -> String {
        let cli = Cli::try_parse_from(std::iter::once("profit").chain(args.iter().copied()))
            .expect("valid arguments");
        let mut out = Vec::new();
        run(&cli, &self.config, &build_registry(), &mut out)
            .await
            .expect("command succeeds");
        String::from_utf8(out).expect("utf-8 output")
    }

    async fn try_run(
        &self,
        args: &[&str],
    ) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("profit").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(&cli, &self.config, &build_registry(), &mut out).await?;
        Ok(String::from_utf8(out)?)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn created_id(output: &str) -> String {
    output
        .split_whitespace()
        .nth(1)
        .expect("output names the project id")
        .to_string()
}

#[tokio::test]
async fn compute_defaults_as_json() {
    let ws = Workspace::new();

    let out = ws.run(&["compute", "--json"]).await;
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["revenue"], 120000.0);
    assert_eq!(value["totalExpensesAmount"], 91400.0);
    assert_eq!(value["profitAmount"], 28600.0);
    assert!(!ws.dir.exists(), "compute without a project must not touch the store");
}

#[tokio::test]
async fn compute_with_edits() {
    let ws = Workspace::new();

    let out = ws
        .run(&["compute", "--quantity", "0", "--json"])
        .await;
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["revenue"], 0.0);
    assert_eq!(value["profitAmount"], -4000.0);
    assert_eq!(value["profitPercent"], 0.0);
}

#[tokio::test]
async fn project_lifecycle() {
    let ws = Workspace::new();

    let created = ws.run(&["projects", "create", "  Офіс  "]).await;
    assert!(created.contains("«Офіс»"));
    let id = created_id(&created);

    let saved = ws
        .run(&[
            "projects", "save", "--project", &id, "--unit-price", "50000", "--amount",
            "marketing=1500",
        ])
        .await;
    assert!(saved.starts_with("Збережено"));

    let shown = ws.run(&["projects", "show", &id, "--json"]).await;
    let value: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(value["revenue"], 50000.0);

    let renamed = ws.run(&["projects", "rename", &id, "Склад"]).await;
    assert!(renamed.contains("«Склад»"));
    assert_eq!(ws.run(&["projects", "rename", &id, "Склад"]).await, "Назва не змінилась\n");

    let mut session = open_session(&build_registry(), &ws.config, None).await.unwrap();
    assert_eq!(session.owner(), &Owner::Anonymous);
    assert_eq!(session.projects().len(), 1);
    session.select(&id).await.unwrap();
    assert_eq!(session.project_name(), "Склад");
    assert_eq!(session.state().unit_price, dec!(50000));
    assert_eq!(
        session.state().expenses.get(ExpenseId::Marketing).mode,
        ExpenseMode::Amount(dec!(1500))
    );

    assert_eq!(ws.run(&["projects", "delete", &id]).await, format!("Видалено {id}\n"));
    assert_eq!(ws.run(&["projects", "list"]).await, "Немає збережених проєктів\n");
}

#[tokio::test]
async fn save_without_project_creates_from_edits() {
    let ws = Workspace::new();

    let out = ws
        .run(&["projects", "save", "--name", "Hall", "--percent", "claims=25%"])
        .await;
    assert!(out.starts_with("Створено"));

    let listed = ws.run(&["projects", "list", "--json"]).await;
    let value: serde_json::Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(value[0]["name"], "Hall");
    assert_eq!(value[0]["ownerId"], "local");
    assert_eq!(value[0]["state"]["expenses"]["claims"]["value"], 0.25);
}

#[tokio::test]
async fn compute_from_saved_project() {
    let ws = Workspace::new();
    let out = ws
        .run(&["projects", "save", "--quantity", "2"])
        .await;
    let id = created_id(&out);

    let computed = ws.run(&["compute", "--project", &id, "--json"]).await;
    let value: serde_json::Value = serde_json::from_str(&computed).unwrap();

    assert_eq!(value["revenue"], 240000.0);
}

#[tokio::test]
async fn unknown_project_is_an_error() {
    let ws = Workspace::new();

    let err = ws.try_run(&["projects", "show", "missing"]).await.unwrap_err();

    assert!(format!("{err:#}").contains("missing"));
}
