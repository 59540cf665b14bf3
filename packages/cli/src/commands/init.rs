use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use campaign_workspace::SyncConfig;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for campaign records
    #[arg(short, long, default_value = "campaigns")]
    pub store_dir: String,

    /// Canvas autosave debounce in milliseconds
    #[arg(long)]
    pub canvas_debounce_ms: Option<u64>,

    /// Module autosave debounce in milliseconds
    #[arg(long)]
    pub module_debounce_ms: Option<u64>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing campaign project...".bright_blue().bold());

    let mut sync = SyncConfig::default();
    if let Some(ms) = args.canvas_debounce_ms {
        sync.canvas_debounce_ms = ms;
    }
    if let Some(ms) = args.module_debounce_ms {
        sync.module_debounce_ms = ms;
    }
    let config = Config {
        store_dir: args.store_dir.clone(),
        sync,
    };

    let store_dir = config.get_store_dir(cwd);
    if !store_dir.exists() {
        fs::create_dir_all(&store_dir)?;
        println!("  {} Created {}/", "✓".green(), args.store_dir);
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Write a mutation script (a JSON array of edits)");
    println!("  2. Run: campaign edit script.json");
    println!("  3. Run: campaign show <id>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            store_dir: "records".into(),
            canvas_debounce_ms: Some(500),
            module_debounce_ms: None,
            force: false,
        };
        init(args, dir.path()).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.store_dir, "records");
        assert_eq!(config.sync.canvas_debounce_ms, 500);
        assert_eq!(config.sync.module_debounce_ms, 1500);
        assert!(dir.path().join("records").is_dir());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "storeDir": "mine" }"#).unwrap();

        let args = InitArgs {
            store_dir: "records".into(),
            canvas_debounce_ms: None,
            module_debounce_ms: None,
            force: false,
        };
        init(args, dir.path()).unwrap();

        assert_eq!(Config::load(dir.path()).unwrap().store_dir, "mine");
    }
}
