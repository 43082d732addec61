//! In-memory entities that compiled predicates and orderings can run against.

use crate::value::Value;
use std::collections::BTreeMap;

/// Read access to an entity's properties by name.
pub trait Entity {
    /// Scalar value of a property. `None` if the entity has no such property.
    fn value(&self, property: &str) -> Option<Value>;

    /// Related entity behind a reference navigation.
    fn reference(&self, property: &str) -> Option<&dyn Entity>;

    /// Related entities behind a collection navigation.
    fn collection(&self, property: &str) -> Vec<&dyn Entity>;
}

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Value(Value),
    Reference(Option<Box<Record>>),
    Collection(Vec<Record>),
}

/// A dynamically shaped entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(property.into(), Field::Value(value.into()));
        self
    }

    pub fn with_null(mut self, property: impl Into<String>) -> Self {
        self.fields.insert(property.into(), Field::Value(Value::Null));
        self
    }

    pub fn with_reference(mut self, property: impl Into<String>, record: Option<Record>) -> Self {
        self.fields
            .insert(property.into(), Field::Reference(record.map(Box::new)));
        self
    }

    pub fn with_collection(mut self, property: impl Into<String>, records: Vec<Record>) -> Self {
        self.fields
            .insert(property.into(), Field::Collection(records));
        self
    }
}

impl Entity for Record {
    fn value(&self, property: &str) -> Option<Value> {
        match self.fields.get(property)? {
            Field::Value(value) => Some(value.clone()),
            _ => None,
        }
    }

    fn reference(&self, property: &str) -> Option<&dyn Entity> {
        match self.fields.get(property)? {
            Field::Reference(Some(record)) => Some(record.as_ref() as &dyn Entity),
            _ => None,
        }
    }

    fn collection(&self, property: &str) -> Vec<&dyn Entity> {
        match self.fields.get(property) {
            Some(Field::Collection(records)) => {
                records.iter().map(|r| r as &dyn Entity).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_access() {
        let record = Record::new()
            .with_value("Id", 1)
            .with_null("Pid")
            .with_reference("Owner", Some(Record::new().with_value("Name", "ann")))
            .with_collection(
                "Tags",
                vec![Record::new().with_value("Code", 1), Record::new()],
            );

        assert_eq!(record.value("Id"), Some(Value::Int32(1)));
        assert_eq!(record.value("Pid"), Some(Value::Null));
        assert_eq!(record.value("Missing"), None);
        assert_eq!(record.value("Owner"), None);
        assert_eq!(
            record.reference("Owner").and_then(|o| o.value("Name")),
            Some(Value::from("ann"))
        );
        assert_eq!(record.collection("Tags").len(), 2);
        assert!(record.collection("Id").is_empty());
    }
}
