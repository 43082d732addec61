//! Filter tokens and the conditions parsed from them.

use serde::{Deserialize, Serialize};

/// One `operator value` pair applied to a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Operator key (`eq`, `gt`, `lt`). Matched case-sensitively.
    pub operator: String,
    /// Raw literal, parsed later against the column's value type.
    pub value: String,
}

impl Condition {
    pub fn new(operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub fn eq(value: impl Into<String>) -> Self {
        Self::new("eq", value)
    }

    pub fn gt(value: impl Into<String>) -> Self {
        Self::new("gt", value)
    }

    pub fn lt(value: impl Into<String>) -> Self {
        Self::new("lt", value)
    }
}

/// A parsed `column operator value` filter token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub column: String,
    pub condition: Condition,
}

impl FilterToken {
    /// Parse a token of exactly three whitespace-separated fields.
    pub fn parse(token: &str) -> Option<Self> {
        let mut fields = token.split_whitespace();
        let column = fields.next()?;
        let operator = fields.next()?;
        let value = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            column: column.to_string(),
            condition: Condition::new(operator, value),
        })
    }
}

/// Filter and ordering strings as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterInfo {
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl FilterInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
}
