//! Compiler configuration: target dialect, entity types and views.
//!
//! ```json
//! {
//!   "dialect": { "kind": "postgres", "array_aggregation": true, "placeholder": "numbered" },
//!   "entities": [{ "name": "Menu", "table": "menus", "properties": [...] }],
//!   "views": [{ "name": "menus", "entity": "Menu", "columns": [...] }]
//! }
//! ```

use crate::catalog::{EntityType, MetadataAdapter, ModelRegistry, ViewModel};
use crate::expression::PropertyPath;
use crate::sql::Dialect;
use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub entities: Vec<EntityType>,
    #[serde(default)]
    pub views: Vec<ViewModel>,
}

impl CompilerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse compiler configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config = Self::from_json_str(&json)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(
            "Loaded {} entities and {} views from {}",
            config.entities.len(),
            config.views.len(),
            path.display()
        );
        Ok(config)
    }

    /// Views must target a configured entity and name valid property paths.
    fn validate(&self) -> Result<()> {
        for view in &self.views {
            if !self.entities.iter().any(|e| e.name == view.entity) {
                bail!("View {} targets unknown entity {}", view.name, view.entity);
            }
            for column in &view.columns {
                PropertyPath::parse(&column.property_name).with_context(|| {
                    format!("Column {} of view {}", column.column_name, view.name)
                })?;
            }
        }
        Ok(())
    }

    pub fn view(&self, name: &str) -> Option<&ViewModel> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Register every entity type and view
    pub fn to_registry(&self) -> ModelRegistry {
        let registry = ModelRegistry::new();
        for entity in &self.entities {
            registry.register(entity.clone());
        }
        for view in &self.views {
            registry.register_view(view.clone());
        }
        registry
    }
}

impl MetadataAdapter for CompilerConfig {
    fn find_entity(&self, name: &str) -> Option<std::sync::Arc<EntityType>> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .map(std::sync::Arc::new)
    }
}
