//! Description of one recursive tree traversal.

use crate::expression::Expression;
use crate::sql::{EntityQuery, Projection};

/// Direction of a tree walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Follow child rows: `step.parent = mytree.key`
    #[default]
    Descendants,
    /// Follow parent rows: `step.key = mytree.parent`
    Ancestors,
}

/// A tree walk over the rows of `base`, starting at the rows matching `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeQuery {
    /// Query both recursive members are compiled from. Its ordering is ignored.
    pub base: EntityQuery,
    pub start: Expression,
    /// Restricts the rows reached after the start rows
    pub filter: Option<Expression>,
    pub traversal: Traversal,
    /// Property whose column orders siblings
    pub order_property: Option<String>,
    /// Keep only rows at this depth. Zero or less keeps every depth.
    pub level: i32,
    pub distinct: bool,
}

impl TreeQuery {
    pub fn new(base: EntityQuery, start: Expression) -> Self {
        Self {
            base,
            start,
            filter: None,
            traversal: Traversal::Descendants,
            order_property: None,
            level: 0,
            distinct: false,
        }
    }

    /// Walk the whole table of `entity`
    pub fn for_entity(entity: impl Into<String>, start: Expression) -> Self {
        Self::new(EntityQuery::new(entity), start)
    }

    pub fn filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn ancestors(self) -> Self {
        self.traversal(Traversal::Ancestors)
    }

    pub fn order_by(mut self, property: impl Into<String>) -> Self {
        self.order_property = Some(property.into());
        self
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Shape the rows of both recursive members and the final result
    pub fn select(mut self, projection: Projection) -> Self {
        self.base.projection = Some(projection);
        self
    }
}
