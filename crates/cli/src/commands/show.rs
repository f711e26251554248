//! `lorewiki show` — Print a saved wiki.

use lorewiki_wiki::{AttributeValue, Entity, Section, Wiki};
use std::path::{Path, PathBuf};

use super::load_config;

pub async fn run(
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    section: Option<String>,
    entity: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let root = output.unwrap_or(config.wiki.output_dir);

    let mut wiki = Wiki::new(&config.wiki.name);
    wiki.load(&root).await?;

    let sections: Vec<&Section> = wiki
        .sections()
        .iter()
        .filter(|s| section.as_deref().is_none_or(|name| s.name() == name))
        .collect();
    if sections.is_empty() {
        return Err(format!("No section named '{}'", section.unwrap_or_default()).into());
    }

    if let Some(name) = entity.as_deref() {
        let found = sections.iter().find_map(|s| s.get(name).map(|e| (*s, e)));
        let Some((section, entity)) = found else {
            return Err(format!("No entity named '{name}'").into());
        };
        print!("{}", render_entity(section, entity));
        return Ok(());
    }

    println!("# {}\n", wiki.name());
    for section in sections {
        println!("## {} ({})\n", section.name(), section.len());
        for entity in section.entities() {
            print!("{}", render_entity(section, entity));
        }
    }
    Ok(())
}

fn render_entity(section: &Section, entity: &Entity) -> String {
    let mut out = format!("### {}\n", entity.name());
    let aliases = section.keys_for(entity.name());
    if aliases.len() > 1 {
        out.push_str(&format!("_Also known as: {}_\n", aliases[1..].join(", ")));
    }
    out.push('\n');

    for attr in entity.attributes() {
        if attr.data().is_empty() {
            continue;
        }
        out.push_str(&format!("**{}**\n\n", attr.name()));
        match attr.data() {
            AttributeValue::Text(text) => {
                out.push_str(text);
                out.push('\n');
            }
            AttributeValue::List(_) => {
                out.push_str(&attr.to_markdown());
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}
