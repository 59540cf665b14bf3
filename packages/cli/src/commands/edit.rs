use crate::commands::show::print_document;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use campaign_editor::{DocumentId, Mutation};
use campaign_workspace::{EditorSession, FileBackend, LoadOutcome, SaveOutcome};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// JSON file holding an array of mutations
    pub script: PathBuf,

    /// Campaign to edit; a new draft is created when omitted
    #[arg(short, long)]
    pub id: Option<String>,

    /// Apply and print the result without writing it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn edit(args: EditArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let backend = Arc::new(FileBackend::new(config.get_store_dir(cwd)));

    let script_path = cwd.join(&args.script);
    let script = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Cannot read {}", script_path.display()))?;
    let mutations: Vec<Mutation> = serde_json::from_str(&script)
        .with_context(|| format!("{} is not a mutation list", script_path.display()))?;

    let session = EditorSession::builder(backend).config(config.sync).build();
    if let Some(id) = &args.id {
        match session.open(DocumentId::permanent(id.clone())).await {
            LoadOutcome::Failed => bail!("Could not load campaign {}", id),
            LoadOutcome::NotFound => println!("{} Starting new campaign {}", "✓".green(), id),
            _ => {}
        }
    }

    println!("{}", "✏️  Applying edits...".bright_blue().bold());
    for (index, mutation) in mutations.into_iter().enumerate() {
        let label = mutation.label();
        session
            .apply(mutation)
            .with_context(|| format!("Edit #{} ({}) was rejected", index + 1, label))?;
        println!("  {} {}", "✓".green(), label);
    }

    if args.dry_run {
        println!();
        print_document(&session.document());
        return Ok(());
    }

    let outcome = session.save().await?;
    session.close().await;

    println!();
    match outcome {
        SaveOutcome::Promoted { to, .. } => {
            println!("{} Created campaign {}", "✅".green(), to.as_str().bright_white());
        }
        SaveOutcome::Saved(id) => {
            println!("{} Saved campaign {}", "✅".green(), id.as_str().bright_white());
        }
        SaveOutcome::Rejected => bail!("Another save is already in progress"),
        SaveOutcome::Skipped(reason) => bail!("Campaign was not saved: {:?}", reason),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_editor::{PersistedRecord, ScreenName};
    use campaign_workspace::PersistenceBackend;

    async fn run(dir: &Path, id: Option<&str>, script: &str) -> Result<()> {
        tokio::fs::write(dir.join("script.json"), script).await?;
        edit(
            EditArgs {
                script: PathBuf::from("script.json"),
                id: id.map(str::to_string),
                dry_run: false,
            },
            dir,
        )
        .await
    }

    async fn stored(dir: &Path, id: &str) -> Option<PersistedRecord> {
        FileBackend::new(dir.join("campaigns")).load(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_edit_creates_named_campaign() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"[
            { "op": "add_module", "screen": "screen2",
              "module": { "type": "text", "id": "text-thanks", "content": "Thanks!" } },
            { "op": "set_zoom", "zoom": 1.5 }
        ]"#;
        run(dir.path(), Some("spring"), script).await.unwrap();

        let doc = stored(dir.path(), "spring").await.unwrap().to_document().unwrap();
        assert!(doc.find_module("text-thanks").is_some());
        assert_eq!(doc.zoom, 1.5);
        assert!(doc.has_launch_module());
    }

    #[tokio::test]
    async fn test_edit_extends_existing_campaign() {
        let dir = tempfile::tempdir().unwrap();
        let first = r#"[{ "op": "add_module", "screen": "screen1",
            "module": { "type": "text", "id": "text-a", "content": "A" } }]"#;
        let second = r#"[{ "op": "add_module", "screen": "screen2",
            "module": { "type": "text", "id": "text-b", "content": "B" } }]"#;
        run(dir.path(), Some("sale"), first).await.unwrap();
        run(dir.path(), Some("sale"), second).await.unwrap();

        let doc = stored(dir.path(), "sale").await.unwrap().to_document().unwrap();
        assert!(doc.find_module("text-a").is_some());
        assert_eq!(doc.modules(ScreenName::Screen2).len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_edit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"[{ "op": "delete_module", "module_id": "missing" }]"#;

        assert!(run(dir.path(), Some("broken"), script).await.is_err());
        assert!(stored(dir.path(), "broken").await.is_none());
    }
}
