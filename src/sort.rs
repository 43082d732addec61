//! Sort compiler: order-by strings to chained key selectors.

pub mod key_selector;
pub mod order_by;

pub use key_selector::{KeyType, NullOrder, OrderChain, Queryable, SortCriteria, SortOrder};
pub use order_by::{parse_order_by, OrderBy};

use crate::catalog::ViewModel;
use crate::error::CompileResult;
use crate::expression::PropertyPath;
use crate::sql::{EntityQuery, OrderTerm};
use log::debug;

impl Queryable for EntityQuery {
    fn apply_ordering(mut self, chain: &OrderChain) -> Self {
        self.ordering = chain
            .criteria()
            .iter()
            .map(|criteria| OrderTerm {
                path: criteria.path.clone(),
                descending: criteria.order == SortOrder::Desc,
            })
            .collect();
        self
    }
}

/// Build the order chain for `order_bys` over the columns of `view`.
///
/// Returns `None` when no term resolves to a view column.
pub fn build_order_chain(
    view: &ViewModel,
    order_bys: &[OrderBy],
) -> CompileResult<Option<OrderChain>> {
    let mut chain: Option<OrderChain> = None;
    for order_by in order_bys {
        let Some(column) = view.column_info(&order_by.key) else {
            debug!("Dropping order term for unknown column '{}'", order_by.key);
            continue;
        };
        let criteria = SortCriteria::new(
            PropertyPath::parse(&column.property_name)?,
            SortOrder::from_direction(&order_by.direction),
            KeyType::from(column.property_value_type),
        );
        chain = Some(match chain {
            None => OrderChain::new(criteria),
            Some(chain) => chain.then(criteria),
        });
    }
    Ok(chain)
}

/// Order `source` by `order_bys`: the first term is the primary key and each
/// later term breaks ties left by the ones before it.
pub fn apply_sort<Q: Queryable>(
    source: Q,
    view: &ViewModel,
    order_bys: &[OrderBy],
) -> CompileResult<Q> {
    Ok(match build_order_chain(view, order_bys)? {
        Some(chain) => source.apply_ordering(&chain),
        None => source,
    })
}

/// Parse `order` and apply it to `source`
pub fn apply_order_by<Q: Queryable>(source: Q, view: &ViewModel, order: &str) -> CompileResult<Q> {
    apply_sort(source, view, &parse_order_by(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnInfo;
    use crate::entity::{Entity, Record};
    use crate::error::CompileError;
    use crate::value::{Value, ValueType};

    fn view() -> ViewModel {
        ViewModel::new("menus", "Menu")
            .with_column(ColumnInfo::new("name", "Name", ValueType::String))
            .with_column(ColumnInfo::new("age", "Age", ValueType::Int32))
            .with_column(ColumnInfo::new("owner", "Owner.Name", ValueType::String))
    }

    fn row(id: i32, name: &str, age: i32) -> Record {
        Record::new()
            .with_value("Id", id)
            .with_value("Name", name)
            .with_value("Age", age)
    }

    #[test]
    fn test_apply_sort_in_memory() {
        let rows = vec![row(1, "b", 30), row(2, "a", 40), row(3, "b", 20)];
        let sorted = apply_order_by(rows, &view(), "name desc, age").unwrap();
        let ids: Vec<Option<Value>> = sorted.iter().map(|r| r.value("Id")).collect();
        assert_eq!(
            ids,
            vec![
                Some(Value::Int32(3)),
                Some(Value::Int32(1)),
                Some(Value::Int32(2))
            ]
        );
    }

    #[test]
    fn test_apply_sort_to_query() {
        let query = EntityQuery::new("Menu").order_by(PropertyPath::property("Id"), false);
        let query = apply_order_by(query, &view(), "owner, age DESC").unwrap();
        assert_eq!(
            query.ordering,
            vec![
                OrderTerm {
                    path: PropertyPath::nested("Owner", "Name"),
                    descending: false
                },
                OrderTerm {
                    path: PropertyPath::property("Age"),
                    descending: true
                },
            ]
        );
    }

    #[test]
    fn test_unknown_columns_dropped() {
        let query = EntityQuery::new("Menu").order_by(PropertyPath::property("Id"), false);
        let query = apply_order_by(query, &view(), "color desc").unwrap();
        // Nothing resolved, so the existing ordering is untouched
        assert_eq!(query.ordering.len(), 1);
        assert_eq!(query.ordering[0].path, PropertyPath::property("Id"));

        let query = apply_order_by(EntityQuery::new("Menu"), &view(), "color, age").unwrap();
        assert_eq!(query.ordering.len(), 1);
        assert_eq!(query.ordering[0].path, PropertyPath::property("Age"));
    }

    #[test]
    fn test_deep_path_is_fatal() {
        let view = ViewModel::new("menus", "Menu").with_column(ColumnInfo::new(
            "deep",
            "A.B.C",
            ValueType::String,
        ));
        let result = apply_order_by(Vec::<Record>::new(), &view, "deep");
        assert!(matches!(result, Err(CompileError::PathTooDeep(_))));
    }
}
