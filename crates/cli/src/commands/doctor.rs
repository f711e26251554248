//! `lorewiki doctor` — Diagnose setup problems.

use lorewiki_wiki::{ChunkOptions, DocStore};
use std::path::Path;
use std::time::Duration;

use super::{config_path, load_config};

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 LoreWiki Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    // Config
    let path = config_path(explicit);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults", path.display());
    }

    let config = match load_config(explicit) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running other checks.");
            return Ok(());
        }
    };

    if config.has_api_key() || config.default_provider == "ollama" {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set GEMINI_API_KEY or add api_key to the config");
        issues += 1;
    }

    // Input documents
    let options = ChunkOptions::from_config(&config.ingest);
    match DocStore::open(&config.ingest.input_dir, &options).await {
        Ok(store) if store.is_empty() => {
            println!(
                "  ⚠️  No chunks selected from {}",
                config.ingest.input_dir.display()
            );
            issues += 1;
        }
        Ok(store) => println!(
            "  ✅ Input: {} of {} chunk(s) selected",
            store.len(),
            store.total()
        ),
        Err(e) => {
            println!("  ❌ Input: {e}");
            issues += 1;
        }
    }

    // Provider
    let router = lorewiki_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => {
            let check = tokio::time::timeout(Duration::from_secs(15), provider.health_check()).await;
            match check {
                Ok(Ok(true)) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(Ok(false)) => {
                    println!("  ⚠️  Provider '{}' answered but looks unhealthy", provider.name());
                    issues += 1;
                }
                Ok(Err(e)) => {
                    println!("  ❌ Provider '{}': {e}", provider.name());
                    issues += 1;
                }
                Err(_) => {
                    println!("  ❌ Provider '{}' timed out", provider.name());
                    issues += 1;
                }
            }
        }
        None => {
            println!("  ❌ Provider '{}' not available", config.default_provider);
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
