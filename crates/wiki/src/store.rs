//! Markdown tree persistence.
//!
//! Layout: `<root>/sections/<section>/entities/<entity>/<attribute>.md`, one
//! directory per canonical entity. Aliases live in the `aliases.md` list and
//! are re-indexed on load.
//!
//! Sanitizing loses characters, so each entity directory also holds a
//! `.name` file with the exact canonical name. Two names that sanitize to the
//! same directory get numbered directories (`Mr_Fool`, `Mr_Fool_2`).

use lorewiki_core::error::StorageError;
use regex_lite::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::catalog::EntityKind;
use crate::entity::Entity;
use crate::section::Section;

/// Holds the entity's canonical name, next to its attribute files.
pub const NAME_FILE: &str = ".name";

static UNSAFE_CHARS: LazyLock<Result<Regex, String>> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\- ]").map_err(|e| e.to_string()));

/// Drop everything outside `[A-Za-z0-9_- ]`, trim, and turn spaces into underscores.
pub fn sanitize_filename(name: &str) -> Result<String, StorageError> {
    let re = UNSAFE_CHARS
        .as_ref()
        .map_err(|e| StorageError::Pattern(e.clone()))?;
    Ok(re.replace_all(name, "").trim().replace(' ', "_"))
}

/// Fallback entity name for directories saved without a `.name` file.
fn entity_name_from_dir(dir_name: &str) -> String {
    dir_name.replace('_', " ")
}

/// First of `base`, `base_2`, `base_3`, ... not yet in `used`.
fn unique_dir_name(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

pub fn sections_dir(root: &Path) -> PathBuf {
    root.join("sections")
}

fn entities_dir(root: &Path, section: &str) -> PathBuf {
    sections_dir(root).join(section).join("entities")
}

/// Write every attribute of every entity. Returns the number of attribute
/// files written.
pub async fn save(sections: &[Section], root: &Path) -> Result<usize, StorageError> {
    let mut written = 0;

    for section in sections {
        let dir = entities_dir(root, section.name());
        create_dir_all(&dir).await?;

        let mut used = HashSet::new();
        for entity in section.entities() {
            let base = sanitize_filename(entity.name())?;
            if base.is_empty() {
                warn!(
                    section = section.name(),
                    entity = entity.name(),
                    "Entity name has no safe characters, not saved"
                );
                continue;
            }
            let dir_name = unique_dir_name(&base, &used);
            if dir_name != base {
                debug!(
                    section = section.name(),
                    entity = entity.name(),
                    dir = %dir_name,
                    "Directory name taken, numbering it"
                );
            }
            used.insert(dir_name.clone());

            let entity_dir = dir.join(&dir_name);
            create_dir_all(&entity_dir).await?;
            write_file(&entity_dir.join(NAME_FILE), entity.name()).await?;
            for attr in entity.attributes() {
                let file = entity_dir.join(format!("{}.md", sanitize_filename(attr.name())?));
                write_file(&file, &attr.to_markdown()).await?;
                written += 1;
            }
        }
    }

    info!(root = %root.display(), files = written, "Saved wiki");
    Ok(written)
}

/// Read a saved tree back into sections, in catalog order.
///
/// Unknown section directories are ignored, missing sections come back
/// empty, and missing attribute files keep their default. Entity names come
/// from `.name`, or from the directory name when that file is absent.
pub async fn load(root: &Path) -> Result<Vec<Section>, StorageError> {
    let base = sections_dir(root);
    if !exists(&base).await {
        return Err(StorageError::MissingRoot(base));
    }

    let mut sections = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        let mut section = Section::new(kind);
        let dir = entities_dir(root, kind.section_name());
        if exists(&dir).await {
            for dir_name in list_dirs(&dir).await? {
                let entity = load_entity(kind, &dir.join(&dir_name), &dir_name).await?;
                if let Err(e) = section.insert_loaded(entity) {
                    warn!(error = %e, "Skipping duplicate entity");
                }
            }
            for conflict in section.index_aliases() {
                warn!(error = %conflict, "Alias not indexed");
            }
        } else {
            debug!(section = kind.section_name(), "No saved entities");
        }
        sections.push(section);
    }

    info!(
        root = %root.display(),
        entities = sections.iter().map(Section::len).sum::<usize>(),
        "Loaded wiki"
    );
    Ok(sections)
}

async fn load_entity(kind: EntityKind, dir: &Path, dir_name: &str) -> Result<Entity, StorageError> {
    let name = match read_optional(&dir.join(NAME_FILE)).await? {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => entity_name_from_dir(dir_name),
    };
    let mut entity = Entity::new(kind, name);
    for attr in entity.attributes_mut() {
        let file = dir.join(format!("{}.md", sanitize_filename(attr.name())?));
        match read_optional(&file).await? {
            Some(content) => attr.from_markdown(&content),
            None => debug!(file = %file.display(), "Missing attribute file, using default"),
        }
    }
    Ok(entity)
}

async fn read_optional(file: &Path) -> Result<Option<String>, StorageError> {
    match tokio::fs::read_to_string(file).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(file, e)),
    }
}

async fn write_file(file: &Path, content: &str) -> Result<(), StorageError> {
    tokio::fs::write(file, content)
        .await
        .map_err(|e| StorageError::io(file, e))
}

/// Sub-directory names of `dir`, sorted.
async fn list_dirs(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(dir, e))?
    {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

async fn create_dir_all(dir: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
