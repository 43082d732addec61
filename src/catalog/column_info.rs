//! View metadata: the columns a caller may filter and sort by.

use crate::value::ValueType;
use serde::{Deserialize, Serialize};

/// How `eq` conditions on a column are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchMode {
    #[default]
    Normal,
    NormalOr,
    /// Bitmask containment
    Flag,
    FlagOr,
    DateTimeYear,
    DateTimeMonth,
    #[serde(rename = "DataTimeDay", alias = "DateTimeDay")]
    DateTimeDay,
    /// `NULL` and `*` are null tests, anything else is equality
    StringValue,
    /// Declared but has no behavior
    Contains,
    ContainsOr,
}

/// How multiple conditions on one column combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Name used by callers in filter and order strings
    pub column_name: String,
    /// Dotted property path on the entity (at most two segments)
    pub property_name: String,
    pub property_value_type: ValueType,
    #[serde(default)]
    pub search_mode: SearchMode,
    #[serde(default)]
    pub filter_mode: FilterMode,
}

impl ColumnInfo {
    pub fn new(
        column_name: impl Into<String>,
        property_name: impl Into<String>,
        property_value_type: ValueType,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            property_name: property_name.into(),
            property_value_type,
            search_mode: SearchMode::Normal,
            filter_mode: FilterMode::And,
        }
    }

    pub fn with_search_mode(mut self, search_mode: SearchMode) -> Self {
        self.search_mode = search_mode;
        self
    }

    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }
}

/// The set of columns a view exposes over one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub name: String,
    pub entity: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

impl ViewModel {
    pub fn new(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column_info(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }
}
