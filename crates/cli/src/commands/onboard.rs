//! `lorewiki onboard` — First-time setup.

use lorewiki_config::{AppConfig, LOCAL_CONFIG_FILE};
use std::path::PathBuf;

pub async fn run(local: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = if local {
        PathBuf::from(LOCAL_CONFIG_FILE)
    } else {
        AppConfig::config_dir().join("config.toml")
    };

    println!("📚 LoreWiki — First-Time Setup");
    println!("==============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    let defaults = AppConfig::default();
    if !defaults.ingest.input_dir.exists() {
        std::fs::create_dir_all(&defaults.ingest.input_dir)?;
        println!(
            "✅ Created input directory: {}",
            defaults.ingest.input_dir.display()
        );
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set GEMINI_API_KEY (or add api_key to {})", config_path.display());
        println!(
            "   2. Put the book's .txt / .md files in {}",
            defaults.ingest.input_dir.display()
        );
        println!("   3. Run: lorewiki chunks, then lorewiki build\n");
    }

    println!("🎉 Setup complete!\n");

    Ok(())
}
