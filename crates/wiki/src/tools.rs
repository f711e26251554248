//! The agent's tool table and the typed commands calls are parsed into.
//!
//! Every tool is a row in `TOOLS`. A raw `ToolCall` is checked against the
//! row's parameters and turned into a `WikiCommand`; nothing is executed here.

use lorewiki_core::error::ToolError;
use lorewiki_core::provider::ToolDefinition;
use lorewiki_core::tool::ToolCall;
use serde_json::{Map, Value, json};

use crate::catalog::EntityKind;

/// What a tool does once its arguments check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Create an entity (idempotent).
    Create(EntityKind),
    /// Buffer the `arg` parameter into `attribute` of the named entity.
    Append {
        kind: EntityKind,
        attribute: &'static str,
        arg: &'static str,
    },
    /// Record and index an alias of a character.
    Alias,
    /// Push a chunk summary to the running summary.
    Summary,
    /// Explicit no-op.
    DoNothing,
}

#[derive(Debug)]
pub struct ToolParam {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ToolKind,
    pub params: &'static [ToolParam],
}

impl ToolSpec {
    /// The section this tool needs, if any.
    pub fn section(&self) -> Option<EntityKind> {
        match self.kind {
            ToolKind::Create(kind) | ToolKind::Append { kind, .. } => Some(kind),
            ToolKind::Alias => Some(EntityKind::Character),
            ToolKind::Summary | ToolKind::DoNothing => None,
        }
    }

    /// JSON Schema definition sent to the model.
    pub fn definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        for param in self.params {
            properties.insert(
                param.name.into(),
                json!({ "type": "string", "description": param.description }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        ToolDefinition {
            name: self.name.into(),
            description: self.description.into(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// A validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiCommand {
    Create {
        kind: EntityKind,
        name: String,
    },
    Append {
        kind: EntityKind,
        name: String,
        attribute: &'static str,
        content: String,
    },
    AddAlias {
        name: String,
        alias: String,
    },
    Summary(String),
    DoNothing,
}

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Parse a raw call into a command.
pub fn parse(call: &ToolCall) -> Result<WikiCommand, ToolError> {
    let spec = find(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
    let arg = |key: &str| string_arg(spec, &call.arguments, key);

    Ok(match spec.kind {
        ToolKind::Create(kind) => WikiCommand::Create {
            kind,
            name: arg("name")?,
        },
        ToolKind::Append {
            kind,
            attribute,
            arg: field,
        } => WikiCommand::Append {
            kind,
            name: arg("name")?,
            attribute,
            content: arg(field)?,
        },
        ToolKind::Alias => WikiCommand::AddAlias {
            name: arg("name")?,
            alias: arg("alias")?,
        },
        ToolKind::Summary => WikiCommand::Summary(arg("summary")?),
        ToolKind::DoNothing => WikiCommand::DoNothing,
    })
}

fn string_arg(spec: &ToolSpec, args: &Value, key: &str) -> Result<String, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool_name: spec.name.into(),
        reason,
    };
    match args.get(key) {
        None | Some(Value::Null) => Err(invalid(format!("missing '{key}'"))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(invalid(format!("'{key}' is empty"))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid(format!("'{key}' must be a string, got {other}"))),
    }
}

const NAME_CHARACTER: ToolParam = ToolParam {
    name: "name",
    description: "Name of the character.",
    required: true,
};
const NAME_SETTING: ToolParam = ToolParam {
    name: "name",
    description: "Name of the setting.",
    required: true,
};
const CONTENT: ToolParam = ToolParam {
    name: "content",
    description: "The content to be added.",
    required: true,
};

pub static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "add_character",
        description: "Call this with every character mentioned in the current chunk. Unnamed \
            characters may be referred to by a title or social standing; use that instead. \
            Call it every time a character is mentioned; duplicates are ignored.",
        kind: ToolKind::Create(EntityKind::Character),
        params: &[ToolParam {
            name: "name",
            description: "The full name or any alias of the character.",
            required: true,
        }],
    },
    ToolSpec {
        name: "add_to_character_personality",
        description: "Add content that helps understand the character's personality. It will \
            be used for a psychological and sociological analysis of the character.",
        kind: ToolKind::Append {
            kind: EntityKind::Character,
            attribute: "personality",
            arg: "content",
        },
        params: &[NAME_CHARACTER, CONTENT],
    },
    ToolSpec {
        name: "add_to_character_trivia",
        description: "Add an interesting piece of trivia about the character. Rephrase it \
            concisely before passing it in.",
        kind: ToolKind::Append {
            kind: EntityKind::Character,
            attribute: "trivia",
            arg: "content",
        },
        params: &[NAME_CHARACTER, CONTENT],
    },
    ToolSpec {
        name: "add_to_character_aliases",
        description: "When a character is mentioned under an alias, add the alias to the \
            character. The full name and any honorific name also count as aliases.",
        kind: ToolKind::Alias,
        params: &[
            NAME_CHARACTER,
            ToolParam {
                name: "alias",
                description: "An alias of the character.",
                required: true,
            },
        ],
    },
    ToolSpec {
        name: "add_to_character_appearance",
        description: "Add content about the character's looks. It will be used to build a \
            detailed physical description.",
        kind: ToolKind::Append {
            kind: EntityKind::Character,
            attribute: "appearance",
            arg: "content",
        },
        params: &[NAME_CHARACTER, CONTENT],
    },
    ToolSpec {
        name: "add_setting",
        description: "Call this with every setting mentioned in the current chunk: places, \
            locations or significant landmarks. Objects are not settings; they belong in a \
            setting's description. Duplicates are ignored.",
        kind: ToolKind::Create(EntityKind::Setting),
        params: &[ToolParam {
            name: "name",
            description: "The name of the setting.",
            required: true,
        }],
    },
    ToolSpec {
        name: "add_to_setting_description",
        description: "Add content describing the setting. It will be used to build a \
            comprehensive description.",
        kind: ToolKind::Append {
            kind: EntityKind::Setting,
            attribute: "description",
            arg: "content",
        },
        params: &[NAME_SETTING, CONTENT],
    },
    ToolSpec {
        name: "add_to_setting_geography",
        description: "Add information about the setting's terrain, climate, natural resources \
            or landmarks.",
        kind: ToolKind::Append {
            kind: EntityKind::Setting,
            attribute: "geography",
            arg: "content",
        },
        params: &[NAME_SETTING, CONTENT],
    },
    ToolSpec {
        name: "add_to_setting_history",
        description: "Add historical background of the setting: major events, changes over \
            time, influential figures.",
        kind: ToolKind::Append {
            kind: EntityKind::Setting,
            attribute: "history",
            arg: "content",
        },
        params: &[NAME_SETTING, CONTENT],
    },
    ToolSpec {
        name: "add_to_setting_culture",
        description: "Add information about the setting's traditions, customs and social \
            norms.",
        kind: ToolKind::Append {
            kind: EntityKind::Setting,
            attribute: "culture",
            arg: "content",
        },
        params: &[NAME_SETTING, CONTENT],
    },
    ToolSpec {
        name: "add_character_to_setting",
        description: "Record that a character appeared at the setting.",
        kind: ToolKind::Append {
            kind: EntityKind::Setting,
            attribute: "characters_involved",
            arg: "character",
        },
        params: &[
            NAME_SETTING,
            ToolParam {
                name: "character",
                description: "Name or alias of the character.",
                required: true,
            },
        ],
    },
    ToolSpec {
        name: "generate_chunk_summary",
        description: "Summarize the current chunk. Calling this is compulsory. The summaries \
            of a few previous chunks are shown with every new chunk to keep track of the plot, \
            the characters present and the current setting. Aim for about 500 words.",
        kind: ToolKind::Summary,
        params: &[ToolParam {
            name: "summary",
            description: "Markdown formatted summary of the current chunk.",
            required: true,
        }],
    },
    ToolSpec {
        name: "do_nothing",
        description: "Call this when the current chunk holds nothing worth recording, such as \
            an index or table of contents.",
        kind: ToolKind::DoNothing,
        params: &[ToolParam {
            name: "reason",
            description: "Why the chunk holds nothing worth recording.",
            required: false,
        }],
    },
];
