//! `lorewiki config` — Configuration management commands.

use lorewiki_config::AppConfig;
use std::path::Path;

use super::{config_path, load_config};

/// Non-fatal problems worth pointing out in a config that parsed fine.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() && config.default_provider != "ollama" {
        warnings.push("No API key set (set GEMINI_API_KEY or LOREWIKI_API_KEY)".to_string());
    }

    if config.ingest.limit == Some(0) {
        warnings.push("ingest.limit = 0 selects no chunks".to_string());
    }

    if config.wiki.use_n_prev_chunks > 20 {
        warnings.push(format!(
            "wiki.use_n_prev_chunks = {} makes every prompt very long",
            config.wiki.use_n_prev_chunks
        ));
    }

    warnings
}

pub async fn validate(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match load_config(explicit) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!(
                "   Model:     {}",
                lorewiki_providers::router::default_model(&config)
            );
            println!("   Input:     {}", config.ingest.input_dir.display());
            println!("   Output:    {}", config.wiki.output_dir.display());
            println!(
                "   Chunking:  {} tokens, {} overlap",
                config.ingest.chunk_size, config.ingest.chunk_overlap
            );
            println!("   Retries:   {}", config.wiki.max_retries);
            println!("   Timeout:   {}s per attempt", config.wiki.request_timeout_secs);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(explicit).map_err(|e| format!("Failed to load config: {e}"))?;
    // Never print secrets
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("[REDACTED]".into());
        }
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    let note = if path.exists() { "" } else { " (not found, defaults in use)" };
    println!("{}{note}", path.display());
    Ok(())
}
