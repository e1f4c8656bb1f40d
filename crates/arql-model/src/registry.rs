use crate::{
    entity::RootEntityModel, error::ModelError, naming::is_safe_identifier,
    relation::RelationModel,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// ModelRegistry
///
/// Name → model lookup surface the compiler resolves `Entities(T)` /
/// `EntityFromID(T, …)` / relation references against. Registration
/// validates physical names once so lowering can emit them verbatim.
///

#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    entities: BTreeMap<String, Arc<RootEntityModel>>,
    relations: BTreeMap<String, Arc<RelationModel>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_root_entity(&mut self, model: RootEntityModel) -> Result<(), ModelError> {
        if !is_safe_identifier(&model.collection_name) {
            return Err(ModelError::InvalidCollectionName {
                name: model.collection_name,
            });
        }
        if self.entities.contains_key(&model.name) {
            return Err(ModelError::DuplicateRootEntity { name: model.name });
        }

        self.entities.insert(model.name.clone(), Arc::new(model));
        Ok(())
    }

    pub fn insert_relation(&mut self, model: RelationModel) -> Result<(), ModelError> {
        if !is_safe_identifier(&model.edge_collection_name) {
            return Err(ModelError::InvalidCollectionName {
                name: model.edge_collection_name,
            });
        }
        if self.relations.contains_key(&model.name) {
            return Err(ModelError::DuplicateRelation { name: model.name });
        }

        self.relations.insert(model.name.clone(), Arc::new(model));
        Ok(())
    }

    pub fn root_entity(&self, name: &str) -> Result<&Arc<RootEntityModel>, ModelError> {
        self.entities
            .get(name)
            .ok_or_else(|| ModelError::UnknownRootEntity {
                name: name.to_string(),
            })
    }

    pub fn relation(&self, name: &str) -> Result<&Arc<RelationModel>, ModelError> {
        self.relations
            .get(name)
            .ok_or_else(|| ModelError::UnknownRelation {
                name: name.to_string(),
            })
    }

    /// Registered root entity models in name order.
    pub fn root_entities(&self) -> impl Iterator<Item = &Arc<RootEntityModel>> {
        self.entities.values()
    }

    /// Registered relation models in name order.
    pub fn relations(&self) -> impl Iterator<Item = &Arc<RelationModel>> {
        self.relations.values()
    }
}
