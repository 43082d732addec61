//! Metadata adapter and the in-process model registry.

pub mod column_info;
pub mod entity_type;

pub use column_info::{ColumnInfo, FilterMode, SearchMode, ViewModel};
pub use entity_type::{
    EntityType, PropertyInfo, PropertyKind, DEFAULT_KEY_PROPERTY, DEFAULT_PARENT_PROPERTY,
};

use crate::error::{CompileError, CompileResult};
use crate::value::ValueType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves table, column and type information for entity types.
pub trait MetadataAdapter {
    fn find_entity(&self, name: &str) -> Option<Arc<EntityType>>;

    fn entity(&self, name: &str) -> CompileResult<Arc<EntityType>> {
        self.find_entity(name)
            .ok_or_else(|| CompileError::UnknownEntity(name.to_string()))
    }

    fn table_name(&self, entity: &str) -> CompileResult<String> {
        Ok(self.entity(entity)?.table.clone())
    }

    fn column_name(&self, entity: &str, property: &str) -> CompileResult<String> {
        Ok(self.entity(entity)?.column_name(property)?.to_string())
    }

    fn value_type(&self, entity: &str, property: &str) -> CompileResult<Option<ValueType>> {
        Ok(self.entity(entity)?.property(property)?.value_type())
    }
}

impl<T: MetadataAdapter + ?Sized> MetadataAdapter for &T {
    fn find_entity(&self, name: &str) -> Option<Arc<EntityType>> {
        (**self).find_entity(name)
    }
}

impl<T: MetadataAdapter + ?Sized> MetadataAdapter for Arc<T> {
    fn find_entity(&self, name: &str) -> Option<Arc<EntityType>> {
        (**self).find_entity(name)
    }
}

/// Registry of entity types and views, shareable across threads.
#[derive(Default)]
pub struct ModelRegistry {
    entities: RwLock<HashMap<String, Arc<EntityType>>>,
    views: RwLock<HashMap<String, Arc<ViewModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type, replacing any previous one with the same name
    pub fn register(&self, entity: EntityType) {
        self.entities
            .write()
            .insert(entity.name.clone(), Arc::new(entity));
    }

    pub fn register_view(&self, view: ViewModel) {
        self.views.write().insert(view.name.clone(), Arc::new(view));
    }

    pub fn view(&self, name: &str) -> Option<Arc<ViewModel>> {
        self.views.read().get(name).cloned()
    }

    /// Registered entity names, sorted
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl MetadataAdapter for ModelRegistry {
    fn find_entity(&self, name: &str) -> Option<Arc<EntityType>> {
        self.entities.read().get(name).cloned()
    }
}
