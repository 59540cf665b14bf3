use crate::config::Config;
use anyhow::{bail, Result};
use campaign_editor::{Document, DocumentId, Module};
use campaign_workspace::{EditorSession, FileBackend, LoadOutcome, PersistenceBackend};
use clap::Args;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Campaign id; lists every campaign when omitted
    pub id: Option<String>,

    /// Print the stored record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let backend = Arc::new(FileBackend::new(config.get_store_dir(cwd)));

    let Some(id) = args.id else {
        let ids = backend.list().await?;
        if ids.is_empty() {
            println!("No campaigns in {}", backend.dir().display());
        }
        for id in ids {
            println!("  {}", id);
        }
        return Ok(());
    };

    if args.json {
        match backend.load(&id).await? {
            Some(record) => println!("{}", record.to_json()?),
            None => bail!("No campaign named {}", id),
        }
        return Ok(());
    }

    let session = EditorSession::builder(backend).config(config.sync).build();
    match session.open(DocumentId::permanent(id.clone())).await {
        LoadOutcome::Hydrated(_) => {}
        LoadOutcome::NotFound => bail!("No campaign named {}", id),
        _ => bail!("Could not load campaign {}", id),
    }
    print_document(&session.document());
    Ok(())
}

/// Screen-by-screen summary of a document
pub fn print_document(doc: &Document) {
    println!("{} {}", "Campaign".bright_blue().bold(), doc.id.as_str().bright_white());
    if let Some(updated_at) = doc.updated_at {
        println!("  updated {}", updated_at.to_rfc3339());
    }
    println!("  device {} at {:.0}%", doc.device.as_str(), doc.zoom * 100.0);

    for screen in doc.screen_names() {
        println!();
        let background = doc.backgrounds.get(&screen).map(|b| b.value.as_str()).unwrap_or("-");
        println!("{} (background {})", screen.to_string().bold(), background);
        let modules = doc.modules(screen);
        if modules.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for module in modules {
            print_module(module, 1);
        }
    }

    if !doc.canvas_elements.is_empty() {
        println!();
        println!("{} {}", "Canvas elements:".bold(), doc.canvas_elements.len());
    }
    if !doc.form_fields.is_empty() {
        println!();
        println!("{}", "Form fields".bold());
        for field in &doc.form_fields {
            let required = if field.required { " *" } else { "" };
            println!("  {}{} [{}]", field.label, required, field.id.dimmed());
        }
    }
}

fn print_module(module: &Module, depth: usize) {
    let indent = "  ".repeat(depth);
    match module.label() {
        Some(label) => println!(
            "{}{} \"{}\" [{}]",
            indent,
            module.kind().as_str().green(),
            label,
            module.id().dimmed()
        ),
        None => println!("{}{} [{}]", indent, module.kind().as_str().green(), module.id().dimmed()),
    }
    for child in module.children().unwrap_or_default() {
        print_module(child, depth + 1);
    }
}
