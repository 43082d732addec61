//! Entity-relational metadata: tables, columns and navigations.

use crate::error::{CompileError, CompileResult};
use crate::value::ValueType;
use serde::{Deserialize, Serialize};

/// Property name of the key in tree-shaped entities
pub const DEFAULT_KEY_PROPERTY: &str = "Id";
/// Property name of the parent reference in tree-shaped entities
pub const DEFAULT_PARENT_PROPERTY: &str = "Pid";

fn default_key() -> String {
    DEFAULT_KEY_PROPERTY.to_string()
}

fn default_parent() -> String {
    DEFAULT_PARENT_PROPERTY.to_string()
}

/// What a property holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    /// A column value.
    Scalar { value_type: ValueType },
    /// A single related entity. `foreign_key` is a property of the declaring entity.
    Reference { target: String, foreign_key: String },
    /// A set of related entities. `foreign_key` is a property of the target entity.
    Collection { target: String, foreign_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    /// Explicit column mapping. Falls back to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

impl PropertyInfo {
    pub fn scalar(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind: PropertyKind::Scalar { value_type },
        }
    }

    pub fn reference(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind: PropertyKind::Reference {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn collection(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind: PropertyKind::Collection {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    /// Set an explicit column name
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match &self.kind {
            PropertyKind::Scalar { value_type } => Some(*value_type),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, PropertyKind::Scalar { .. })
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, PropertyKind::Collection { .. })
    }
}

/// Mapping of one entity type onto a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub table: String,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_parent")]
    pub parent: String,
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
}

impl EntityType {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            key: default_key(),
            parent: default_parent(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property(&self, name: &str) -> CompileResult<&PropertyInfo> {
        self.find_property(name)
            .ok_or_else(|| CompileError::UnknownProperty {
                entity: self.name.clone(),
                property: name.to_string(),
            })
    }

    pub fn column_name(&self, property: &str) -> CompileResult<&str> {
        Ok(self.property(property)?.column_name())
    }

    /// Column of `property`, or the property name itself when it is not declared
    pub fn column_or_name<'a>(&'a self, property: &'a str) -> &'a str {
        self.find_property(property)
            .map(PropertyInfo::column_name)
            .unwrap_or(property)
    }

    pub fn key_column(&self) -> &str {
        self.column_or_name(&self.key)
    }

    pub fn parent_column(&self) -> &str {
        self.column_or_name(&self.parent)
    }

    /// Scalar properties in declaration order
    pub fn scalar_properties(&self) -> impl Iterator<Item = &PropertyInfo> {
        self.properties.iter().filter(|p| p.is_scalar())
    }

    /// Target entity and foreign key of a collection navigation.
    pub fn collection_target(&self, navigation: &str) -> CompileResult<(&str, &str)> {
        match &self.property(navigation)?.kind {
            PropertyKind::Collection {
                target,
                foreign_key,
            } => Ok((target, foreign_key)),
            _ => Err(CompileError::NotANavigation {
                entity: self.name.clone(),
                property: navigation.to_string(),
                expected: "collection",
            }),
        }
    }

    /// Target entity and foreign key of a reference navigation.
    pub fn reference_target(&self, navigation: &str) -> CompileResult<(&str, &str)> {
        match &self.property(navigation)?.kind {
            PropertyKind::Reference {
                target,
                foreign_key,
            } => Ok((target, foreign_key)),
            _ => Err(CompileError::NotANavigation {
                entity: self.name.clone(),
                property: navigation.to_string(),
                expected: "reference",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> EntityType {
        EntityType::new("Menu", "menus")
            .with_property(PropertyInfo::scalar("Id", ValueType::Int32).with_column("id"))
            .with_property(PropertyInfo::scalar("Name", ValueType::String))
            .with_property(PropertyInfo::collection(
                "PermissionAssign",
                "PermissionAssign",
                "MenuId",
            ))
    }

    #[test]
    fn test_column_fallback() {
        let menu = menu();
        assert_eq!(menu.column_name("Id").unwrap(), "id");
        assert_eq!(menu.column_name("Name").unwrap(), "Name");
        assert!(matches!(
            menu.column_name("Missing"),
            Err(CompileError::UnknownProperty { .. })
        ));

        // Tree columns fall back to the property name when undeclared
        assert_eq!(menu.key_column(), "id");
        assert_eq!(menu.parent_column(), "Pid");
    }

    #[test]
    fn test_navigation_lookup() {
        let menu = menu();
        assert_eq!(
            menu.collection_target("PermissionAssign").unwrap(),
            ("PermissionAssign", "MenuId")
        );
        assert!(matches!(
            menu.collection_target("Name"),
            Err(CompileError::NotANavigation {
                expected: "collection",
                ..
            })
        ));
        assert!(menu.reference_target("PermissionAssign").is_err());
    }

    #[test]
    fn test_deserialize_entity_type() {
        let json = r#"{
            "name": "Menu",
            "table": "menus",
            "properties": [
                { "name": "Id", "column": "id", "kind": "scalar", "value_type": "Int32" },
                { "name": "Price", "kind": "scalar", "value_type": "Decimal" },
                { "name": "Roles", "kind": "collection", "target": "Role", "foreign_key": "MenuId" }
            ]
        }"#;
        let entity: EntityType = serde_json::from_str(json).unwrap();
        assert_eq!(entity.key, "Id");
        assert_eq!(entity.parent, "Pid");
        assert_eq!(entity.properties.len(), 3);
        assert_eq!(
            entity.find_property("Price").unwrap().value_type(),
            Some(ValueType::Double)
        );
        assert!(entity.find_property("Roles").unwrap().is_collection());
    }
}
