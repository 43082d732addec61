//! Key selectors and chained comparators over entities.
//!
//! Supports:
//! - Multi-key ordering (primary key, then secondary keys on ties)
//! - NULL handling (NULLs first or last)
//! - Typed comparison per declared value type

use crate::entity::Entity;
use crate::expression::{evaluate_expression, Expression, PropertyPath};
use crate::value::{Value, ValueType};
use std::cmp::Ordering;

/// Sort order for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Empty and `asc` are ascending; anything else is descending
    pub fn from_direction(direction: &str) -> Self {
        if direction.is_empty() || direction == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// NULL ordering preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// How keys are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Int32,
    Int64,
    Double,
    DateTime,
    /// Natural ordering where kinds agree, textual otherwise
    Generic,
}

impl From<ValueType> for KeyType {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Int32 => KeyType::Int32,
            ValueType::Int64 => KeyType::Int64,
            ValueType::Double => KeyType::Double,
            ValueType::DateTime => KeyType::DateTime,
            ValueType::Boolean | ValueType::String => KeyType::Generic,
        }
    }
}

/// Sort criteria for a single key
#[derive(Debug, Clone, PartialEq)]
pub struct SortCriteria {
    /// Property the key is read from
    pub path: PropertyPath,
    pub order: SortOrder,
    pub null_order: NullOrder,
    pub key_type: KeyType,
}

impl SortCriteria {
    /// Create new sort criteria with default NULL ordering
    /// (NULLs first for ASC, NULLs last for DESC)
    pub fn new(path: PropertyPath, order: SortOrder, key_type: KeyType) -> Self {
        let null_order = match order {
            SortOrder::Asc => NullOrder::First,
            SortOrder::Desc => NullOrder::Last,
        };
        Self {
            path,
            order,
            null_order,
            key_type,
        }
    }

    pub fn with_null_order(mut self, null_order: NullOrder) -> Self {
        self.null_order = null_order;
        self
    }

    /// Read the key from an entity. Unreadable keys sort as NULL.
    pub fn key(&self, entity: &dyn Entity) -> Value {
        evaluate_expression(&Expression::property(self.path.clone()), entity).unwrap_or(Value::Null)
    }

    pub fn compare(&self, a: &dyn Entity, b: &dyn Entity) -> Ordering {
        compare_values(&self.key(a), &self.key(b), self.key_type, self.order, self.null_order)
    }
}

/// Compare two keys according to sort order and null handling
fn compare_values(
    v1: &Value,
    v2: &Value,
    key_type: KeyType,
    order: SortOrder,
    null_order: NullOrder,
) -> Ordering {
    match (v1, v2) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => match null_order {
            NullOrder::First => Ordering::Less,
            NullOrder::Last => Ordering::Greater,
        },
        (_, Value::Null) => match null_order {
            NullOrder::First => Ordering::Greater,
            NullOrder::Last => Ordering::Less,
        },
        (v1, v2) => {
            let cmp = compare_non_null_values(v1, v2, key_type);
            match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            }
        }
    }
}

fn compare_non_null_values(v1: &Value, v2: &Value, key_type: KeyType) -> Ordering {
    let typed = match key_type {
        KeyType::Int32 | KeyType::Int64 => v1.as_i64().zip(v2.as_i64()).map(|(a, b)| a.cmp(&b)),
        KeyType::Double => v1
            .as_f64()
            .zip(v2.as_f64())
            .map(|(a, b)| a.total_cmp(&b)),
        KeyType::DateTime => match (v1, v2) {
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        },
        KeyType::Generic => None,
    };
    typed
        .or_else(|| v1.partial_compare(v2))
        .unwrap_or_else(|| v1.to_string().cmp(&v2.to_string()))
}

/// A primary key selector followed by tie-breaking secondary selectors
#[derive(Debug, Clone, PartialEq)]
pub struct OrderChain {
    criteria: Vec<SortCriteria>,
}

impl OrderChain {
    pub fn new(primary: SortCriteria) -> Self {
        Self {
            criteria: vec![primary],
        }
    }

    /// Chain a secondary key, consulted only when earlier keys tie
    pub fn then(mut self, next: SortCriteria) -> Self {
        self.criteria.push(next);
        self
    }

    pub fn criteria(&self) -> &[SortCriteria] {
        &self.criteria
    }

    pub fn compare(&self, a: &dyn Entity, b: &dyn Entity) -> Ordering {
        for criteria in &self.criteria {
            let cmp = criteria.compare(a, b);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

/// A source an ordering can be applied to.
pub trait Queryable: Sized {
    /// Order by `chain`, replacing any ordering already applied
    fn apply_ordering(self, chain: &OrderChain) -> Self;
}

impl<R: Entity> Queryable for Vec<R> {
    /// Stable: rows that tie on every key keep their relative order.
    fn apply_ordering(mut self, chain: &OrderChain) -> Self {
        self.sort_by(|a, b| chain.compare(a, b));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use time::macros::datetime;

    fn row(id: i32, name: &str, score: Option<f64>) -> Record {
        let record = Record::new().with_value("Id", id).with_value("Name", name);
        match score {
            Some(score) => record.with_value("Score", score),
            None => record.with_null("Score"),
        }
    }

    fn ids(rows: &[Record]) -> Vec<i32> {
        rows.iter()
            .map(|r| match r.value("Id") {
                Some(Value::Int32(id)) => id,
                other => panic!("unexpected id {:?}", other),
            })
            .collect()
    }

    fn criteria(property: &str, order: SortOrder, key_type: KeyType) -> SortCriteria {
        SortCriteria::new(PropertyPath::property(property), order, key_type)
    }

    #[test]
    fn test_single_key() {
        let rows = vec![row(1, "b", None), row(2, "a", None), row(3, "c", None)];
        let sorted = rows.apply_ordering(&OrderChain::new(criteria(
            "Name",
            SortOrder::Desc,
            KeyType::Generic,
        )));
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let rows = vec![
            row(1, "b", Some(1.0)),
            row(2, "a", Some(2.0)),
            row(3, "a", Some(1.0)),
            row(4, "b", Some(1.0)),
        ];
        let chain = OrderChain::new(criteria("Name", SortOrder::Asc, KeyType::Generic))
            .then(criteria("Score", SortOrder::Desc, KeyType::Double));
        let sorted = rows.apply_ordering(&chain);
        // Rows 1 and 4 tie on both keys and keep their input order
        assert_eq!(ids(&sorted), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_null_ordering() {
        let rows = vec![row(1, "a", Some(2.0)), row(2, "b", None), row(3, "c", Some(1.0))];

        let asc = rows
            .clone()
            .apply_ordering(&OrderChain::new(criteria("Score", SortOrder::Asc, KeyType::Double)));
        assert_eq!(ids(&asc), vec![2, 3, 1]);

        let desc = rows
            .clone()
            .apply_ordering(&OrderChain::new(criteria("Score", SortOrder::Desc, KeyType::Double)));
        assert_eq!(ids(&desc), vec![1, 3, 2]);

        let nulls_last = rows.apply_ordering(&OrderChain::new(
            criteria("Score", SortOrder::Asc, KeyType::Double).with_null_order(NullOrder::Last),
        ));
        assert_eq!(ids(&nulls_last), vec![3, 1, 2]);
    }

    #[test]
    fn test_typed_comparison() {
        // Mixed integer widths compare numerically
        assert_eq!(
            compare_non_null_values(&Value::Int32(10), &Value::Int64(9), KeyType::Int64),
            Ordering::Greater
        );
        assert_eq!(
            compare_non_null_values(
                &Value::DateTime(datetime!(2023-01-02 0:00)),
                &Value::DateTime(datetime!(2023-01-01 0:00)),
                KeyType::DateTime
            ),
            Ordering::Greater
        );
        // Generic falls back to text when kinds differ
        assert_eq!(
            compare_non_null_values(&Value::from("10"), &Value::Int32(9), KeyType::Generic),
            Ordering::Less
        );
    }

    #[test]
    fn test_key_type_from_value_type() {
        assert_eq!(KeyType::from(ValueType::Int32), KeyType::Int32);
        assert_eq!(KeyType::from(ValueType::DateTime), KeyType::DateTime);
        assert_eq!(KeyType::from(ValueType::String), KeyType::Generic);
        assert_eq!(SortOrder::from_direction("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_direction(""), SortOrder::Asc);
        assert_eq!(SortOrder::from_direction("desc"), SortOrder::Desc);
    }
}
