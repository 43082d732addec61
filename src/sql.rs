//! Query compilation: entity queries to dialect-specific SQL.
//!
//! Statements are built as structural fragments ([`SelectStatement`]) and
//! only rendered to text at the end, so callers such as the hierarchical
//! compiler can splice columns, joins and conjuncts into them safely.

pub mod compiler;
pub mod dialect;
pub mod fragment;
pub mod query;
pub mod writer;

pub use compiler::{QueryCompiler, RelationalCompiler};
pub use dialect::{Dialect, DialectKind, PlaceholderStyle};
pub use fragment::{Join, JoinKind, SelectItem, SelectStatement, SqlPart, SqlText, TableRef};
pub use query::{CompiledQuery, EntityQuery, OrderTerm, Projection, ProjectionItem};
pub use writer::{render_select, ParameterMode, SqlWriter};
