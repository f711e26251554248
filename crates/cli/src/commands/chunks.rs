//! `lorewiki chunks` — Preview how the input is split.

use lorewiki_wiki::chunker::estimate_tokens;
use lorewiki_wiki::{Chunk, ChunkOptions, DocStore};
use std::path::{Path, PathBuf};

use super::load_config;

const PREVIEW_CHARS: usize = 72;

pub async fn run(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let dir = input.unwrap_or(config.ingest.input_dir.clone());
    let options = ChunkOptions::from_config(&config.ingest);
    let store = DocStore::open(&dir, &options).await?;

    println!(
        "{} chunk(s) in {}, {} selected (skip = {}, limit = {})\n",
        store.total(),
        dir.display(),
        store.len(),
        options.skip,
        options
            .limit
            .map_or_else(|| "none".to_string(), |l| l.to_string())
    );
    for chunk in store.chunks() {
        println!("{}", describe(chunk));
    }
    Ok(())
}

fn describe(chunk: &Chunk) -> String {
    let flat: String = chunk
        .text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut preview: String = flat.chars().take(PREVIEW_CHARS).collect();
    if flat.chars().count() > PREVIEW_CHARS {
        preview.push('…');
    }
    format!(
        "#{:<4} {:<20} ~{:>5} tokens  {preview}",
        chunk.index,
        chunk.source,
        estimate_tokens(&chunk.text)
    )
}
