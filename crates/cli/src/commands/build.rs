//! `lorewiki build` — Run the input documents through the agent and save the wiki.

use lorewiki_core::event::WikiEvent;
use lorewiki_wiki::{ChunkOptions, DocStore, Entity, Wiki};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::debug;

use super::load_config;

pub async fn run(
    config_path: Option<&Path>,
    force: bool,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(input) = input {
        config.ingest.input_dir = input;
    }
    if let Some(output) = output {
        config.wiki.output_dir = output;
    }

    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!("⚠️  No API key configured. Set GEMINI_API_KEY or run `lorewiki onboard`.");
    }

    let router = lorewiki_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not available", config.default_provider))?;

    let options = ChunkOptions::from_config(&config.ingest);
    debug!(
        input = %config.ingest.input_dir.display(),
        output = %config.wiki.output_dir.display(),
        chunk_size = options.chunk_size,
        overlap = options.overlap,
        "Build settings"
    );
    let store = DocStore::open(&config.ingest.input_dir, &options).await?;
    if store.is_empty() {
        println!(
            "Nothing to do: no chunks in {} (skip = {}).",
            config.ingest.input_dir.display(),
            options.skip
        );
        return Ok(());
    }

    println!("📚 {} — building from {} chunk(s)", config.wiki.name, store.len());
    println!(
        "   Provider: {} / {}",
        config.default_provider,
        lorewiki_providers::router::default_model(&config)
    );
    println!();

    let mut wiki = Wiki::from_config(&config, provider);
    let progress = tokio::spawn(print_progress(wiki.events().subscribe()));

    let result = wiki.read_chunks(store.chunks()).await;
    let run = match result {
        Ok(run) => run,
        Err(e) => {
            progress.abort();
            return Err(e.into());
        }
    };

    let final_pass = wiki.update_sections(force).await;
    let files = match wiki.save(&config.wiki.output_dir).await {
        Ok(files) => files,
        Err(e) => {
            progress.abort();
            return Err(e.into());
        }
    };
    // The printer stops on the WikiSaved event, after everything before it
    let _ = progress.await;
    let pending: usize = wiki
        .sections()
        .iter()
        .flat_map(|s| s.entities())
        .map(Entity::pending)
        .sum();

    println!();
    println!("✅ Processed {} chunk(s)", run.chunks);
    println!(
        "   Tool calls: {} ({} failed)",
        run.tool_calls, run.failed_calls
    );
    println!("   Final pass: {} attribute(s) updated", final_pass.updated);
    if pending > 0 {
        println!("   Still buffered: {pending} observation(s), run with --force to flush them");
    }
    for section in wiki.sections() {
        println!("   {}: {}", section.name(), section.len());
    }
    println!(
        "   Saved {files} file(s) to {}",
        config.wiki.output_dir.display()
    );

    Ok(())
}

fn progress_line(event: &WikiEvent) -> Option<String> {
    match event {
        WikiEvent::ChunkProcessed {
            index,
            tool_calls,
            failed_calls,
            ..
        } => Some(format!(
            "  • chunk {index}: {tool_calls} call(s), {failed_calls} failed"
        )),
        WikiEvent::EntityCreated { section, name, .. } => Some(format!("    + {section}: {name}")),
        _ => None,
    }
}

/// Print progress lines until the wiki is saved or the bus closes.
/// Returns the number of lines printed.
async fn print_progress(mut rx: Receiver<Arc<WikiEvent>>) -> usize {
    let mut printed = 0;
    loop {
        match rx.recv().await {
            Ok(event) => {
                if matches!(event.as_ref(), WikiEvent::WikiSaved { .. }) {
                    break;
                }
                if let Some(line) = progress_line(&event) {
                    println!("{line}");
                    printed += 1;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
    printed
}
