//! Sections: an arena of entities plus a name/alias index.
//!
//! Aliases are extra index keys pointing at the same `EntityId`. An index
//! key, once bound, is never re-pointed at another entity.

use lorewiki_core::error::WikiError;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::attribute::NameSnapshot;
use crate::catalog::EntityKind;
use crate::entity::{Entity, EntityId};

#[derive(Debug, Clone)]
pub struct Section {
    kind: EntityKind,
    entities: Vec<Entity>,
    index: HashMap<String, EntityId>,
}

impl Section {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.section_name()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in creation order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Resolve a name or alias.
    pub fn resolve(&self, name: &str) -> Option<EntityId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.resolve(name).map(|id| &self.entities[id.0])
    }

    /// Create an entity unless `name` already resolves.
    ///
    /// Returns the entity id and whether it was newly created.
    pub fn create(&mut self, name: &str) -> (EntityId, bool) {
        if let Some(id) = self.resolve(name) {
            debug!(section = self.name(), name, "Entity already exists");
            return (id, false);
        }
        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(self.kind, name));
        self.index.insert(name.to_string(), id);
        info!(section = self.name(), name, "Added {}", self.kind);
        (id, true)
    }

    /// Append one observation to one attribute of an existing entity.
    pub fn append(&mut self, name: &str, attribute: &str, content: &str) -> Result<(), WikiError> {
        let id = self.require(name)?;
        let entity = &mut self.entities[id.0];
        let entity_name = entity.name().to_string();
        let attr = entity
            .attribute_mut(attribute)
            .ok_or_else(|| WikiError::AttributeNotFound {
                entity: entity_name,
                attribute: attribute.to_string(),
            })?;
        attr.add_to_buffer(content);
        debug!(
            section = self.kind.section_name(),
            entity = name,
            attribute,
            buffered = attr.buffer().len(),
            "Buffered observation"
        );
        Ok(())
    }

    /// Record `alias` for the entity `name` resolves to, and index it.
    ///
    /// An alias already bound to a different entity is rejected and nothing
    /// changes.
    pub fn add_alias(&mut self, name: &str, alias: &str) -> Result<(), WikiError> {
        let id = self.require(name)?;
        let attribute = self
            .kind
            .alias_attribute()
            .ok_or_else(|| WikiError::AttributeNotFound {
                entity: self.entities[id.0].name().to_string(),
                attribute: "aliases".into(),
            })?;

        if let Some(existing) = self.resolve(alias) {
            if existing != id {
                return Err(WikiError::AliasConflict {
                    section: self.name().to_string(),
                    alias: alias.to_string(),
                    existing: self.entities[existing.0].name().to_string(),
                    target: self.entities[id.0].name().to_string(),
                });
            }
        }

        self.append(name, attribute, alias)?;
        self.index.insert(alias.to_string(), id);
        Ok(())
    }

    /// Every index key mapped to its entity's canonical name.
    pub fn name_snapshot(&self) -> NameSnapshot {
        self.index
            .iter()
            .map(|(key, id)| (key.clone(), self.entities[id.0].name().to_string()))
            .collect()
    }

    /// All index keys that resolve to `name`'s entity, canonical name first.
    pub fn keys_for(&self, name: &str) -> Vec<&str> {
        let Some(id) = self.resolve(name) else {
            return Vec::new();
        };
        let canonical = self.entities[id.0].name();
        let mut keys: Vec<&str> = self
            .index
            .iter()
            .filter(|(key, target)| **target == id && key.as_str() != canonical)
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys.insert(0, canonical);
        keys
    }

    /// Insert a fully formed entity, e.g. when loading from disk.
    ///
    /// Only the canonical name is indexed; call `index_aliases` once every
    /// entity is in.
    pub(crate) fn insert_loaded(&mut self, entity: Entity) -> Result<EntityId, WikiError> {
        if let Some(existing) = self.resolve(entity.name()) {
            return Err(WikiError::AliasConflict {
                section: self.name().to_string(),
                alias: entity.name().to_string(),
                existing: self.entities[existing.0].name().to_string(),
                target: entity.name().to_string(),
            });
        }
        let id = EntityId(self.entities.len());
        self.index.insert(entity.name().to_string(), id);
        self.entities.push(entity);
        Ok(id)
    }

    /// Index the stored alias items of every entity.
    ///
    /// Aliases already bound to another entity are left out and returned as
    /// conflicts.
    pub(crate) fn index_aliases(&mut self) -> Vec<WikiError> {
        let Some(attribute) = self.kind.alias_attribute() else {
            return Vec::new();
        };
        let mut conflicts = Vec::new();

        for (pos, entity) in self.entities.iter().enumerate() {
            let id = EntityId(pos);
            let aliases = entity
                .attribute(attribute)
                .and_then(|a| a.data().as_list())
                .unwrap_or_default();
            for alias in aliases {
                match self.index.get(alias) {
                    None => {
                        self.index.insert(alias.clone(), id);
                    }
                    Some(&bound) if bound == id => {}
                    Some(&bound) => conflicts.push(WikiError::AliasConflict {
                        section: self.kind.section_name().to_string(),
                        alias: alias.clone(),
                        existing: self.entities[bound.0].name().to_string(),
                        target: entity.name().to_string(),
                    }),
                }
            }
        }
        conflicts
    }

    fn require(&self, name: &str) -> Result<EntityId, WikiError> {
        self.resolve(name).ok_or_else(|| WikiError::EntityNotFound {
            section: self.name().to_string(),
            name: name.to_string(),
        })
    }
}
