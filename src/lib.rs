pub mod authorization;
pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod expression;
pub mod filter;
pub mod hierarchy;
pub mod sort;
pub mod sql;
pub mod value;

pub use error::{CompileError, CompileResult};
