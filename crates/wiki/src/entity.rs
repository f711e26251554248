use crate::attribute::Attribute;
use crate::catalog::EntityKind;

/// Position of an entity in its section's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// A character or setting with the fixed attribute set of its kind.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    kind: EntityKind,
    attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: kind.attributes().iter().map(Attribute::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut [Attribute] {
        &mut self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name() == name)
    }

    /// Observations still waiting in any buffer.
    pub fn pending(&self) -> usize {
        self.attributes.iter().map(|a| a.buffer().len()).sum()
    }
}
