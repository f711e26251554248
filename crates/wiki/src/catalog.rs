//! Entity kinds and the static attribute specs each kind carries.
//!
//! The attribute set of an entity is fixed by its kind. Order here is the
//! declaration order used by the update pass and by persistence.

use serde::{Deserialize, Serialize};

/// How an attribute accumulates and stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Prose rewritten by the synthesis backend.
    Text,
    /// Deduplicated list of strings, merged without a model call.
    List,
    /// List of character names, canonicalized against the characters section.
    CharacterList,
}

/// Static description of one attribute.
#[derive(Debug)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub instructions: &'static str,
    pub threshold: usize,
    pub kind: AttributeKind,
}

/// The kinds of entity a wiki can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Setting,
}

impl EntityKind {
    /// All kinds, in section declaration order.
    pub const ALL: [EntityKind; 2] = [EntityKind::Character, EntityKind::Setting];

    /// Name of the section holding entities of this kind.
    pub fn section_name(self) -> &'static str {
        match self {
            Self::Character => "characters",
            Self::Setting => "settings",
        }
    }

    pub fn from_section_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.section_name() == name)
    }

    /// Attribute specs in declaration order.
    pub fn attributes(self) -> &'static [AttributeSpec] {
        match self {
            Self::Character => CHARACTER_ATTRIBUTES,
            Self::Setting => SETTING_ATTRIBUTES,
        }
    }

    pub fn attribute(self, name: &str) -> Option<&'static AttributeSpec> {
        self.attributes().iter().find(|a| a.name == name)
    }

    /// The attribute whose items double as extra index keys, if any.
    pub fn alias_attribute(self) -> Option<&'static str> {
        match self {
            Self::Character => Some("aliases"),
            Self::Setting => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Character => write!(f, "character"),
            Self::Setting => write!(f, "setting"),
        }
    }
}

static CHARACTER_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "personality",
        description: "Markdown formatted: analysis of the character's personality.",
        instructions: "Write a short essay on the character's personality. Analyze it from a \
            psychological and sociological perspective, combining the new observations with \
            the previous analysis.",
        threshold: 3,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "trivia",
        description: "Markdown formatted: interesting trivia related to the character.",
        instructions: "Keep this as a list of the character's trivia. Make the list as \
            interesting as possible.",
        threshold: 3,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "aliases",
        description: "All known aliases of the character.",
        instructions: "",
        threshold: 1,
        kind: AttributeKind::List,
    },
    AttributeSpec {
        name: "appearance",
        description: "Markdown formatted: detailed physical description of the character.",
        instructions: "Give a detailed physical description of the character. Enrich the \
            existing description with the new observations and track how the appearance \
            changes over the course of the story.",
        threshold: 2,
        kind: AttributeKind::Text,
    },
];

static SETTING_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        name: "description",
        description: "Markdown formatted: detailed description of the setting.",
        instructions: "Give a comprehensive description of the setting, including notable \
            features, landmarks, climate and general atmosphere. Enrich the existing \
            description with the new observations.",
        threshold: 3,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "history",
        description: "Markdown formatted: historical background of the setting.",
        instructions: "Give the historical background of the setting: major events, changes \
            over time and influential figures.",
        threshold: 1,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "geography",
        description: "Markdown formatted: geographical features of the setting.",
        instructions: "Describe the geography of the setting: terrain, climate, natural \
            resources and significant landmarks.",
        threshold: 1,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "culture",
        description: "Markdown formatted: cultural aspects of the setting.",
        instructions: "Describe the culture of the setting: traditions, customs, social norms \
            and other relevant details.",
        threshold: 1,
        kind: AttributeKind::Text,
    },
    AttributeSpec {
        name: "characters_involved",
        description: "Characters who appeared at the setting.",
        instructions: "",
        threshold: 1,
        kind: AttributeKind::CharacterList,
    },
];
