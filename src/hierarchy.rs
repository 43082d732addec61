//! Hierarchical (recursive CTE) queries over tree-shaped entities.

pub mod compiler;
pub mod tree_query;
pub mod tree_repository;

pub use compiler::{HierarchicalQueryCompiler, CTE_NAME, LEVEL_COLUMN, SORDER_COLUMN};
pub use tree_query::{Traversal, TreeQuery};
pub use tree_repository::TreeRepository;
