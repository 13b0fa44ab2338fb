//! # sqlshift
//!
//! Rewrites prepared-statement call chains into fluent query-builder chains,
//! without ever running the SQL.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlshift::prelude::*;
//!
//! let unit = Unit::new("UserRepository::adults", vec![
//!     Stmt::assign(
//!         Expr::var("stmt"),
//!         Expr::call(Expr::var("pdo"), "prepare", vec![Expr::str("SELECT * FROM users WHERE age > ?")]),
//!     ),
//!     Stmt::expr(Expr::call(Expr::var("stmt"), "execute", vec![Expr::list(vec![Expr::Int(18)])])),
//! ]);
//!
//! let outcome = Translator::default().translate_unit(&unit);
//! let syntax = FluentSyntax::default();
//! assert_eq!(
//!     syntax.emit_stmt(&outcome.unit.body[0]),
//!     "stmt = pdo.createQueryBuilder().select('*').from('users').where('age > :param1');"
//! );
//! assert_eq!(
//!     syntax.emit_stmt(&outcome.unit.body[1]),
//!     "stmt.setParameters(['param1' => 18]).executeQuery();"
//! );
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | extract | [`extractor`] | literal SQL or nothing |
//! | normalize | [`normalizer`] | [`SqlText`](normalizer::SqlText), [`StatementKind`](normalizer::StatementKind) |
//! | parse | [`parser`] | [`ClauseSet`](parser::ClauseSet) |
//! | split | [`splitter`] | WHERE/HAVING predicates |
//! | build | [`builder`] | [`CallChain`](builder::CallChain) |
//! | dispatch | [`driver`] | rewritten statements + diagnostics |
//!
//! Anything uncertain along the way leaves the call site untouched.

pub mod ast;
pub mod builder;
pub mod config;
mod dispatcher;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod normalizer;
pub mod params;
pub mod parser;
pub mod render;
pub mod scope;
pub mod splitter;

pub mod prelude {
    pub use crate::ast::{ArrayItem, Expr, MethodCall, Stmt, Unit};
    pub use crate::builder::{BuilderCall, CallChain};
    pub use crate::config::{BuilderAccess, RenderConfig, TranslatorConfig};
    pub use crate::driver::{NodeRewrite, Rewrite, Translator, UnitOutcome};
    pub use crate::error::*;
    pub use crate::gate::{TranslatedStatement, translate_sql, translate_text};
    pub use crate::normalizer::{Placeholders, SqlText, StatementKind};
    pub use crate::render::{FluentSyntax, TargetSyntax};
    pub use crate::scope::{Diagnostic, Origin, TranslationScope};
    pub use crate::splitter::{Joiner, Predicate, split};
}

/// Translate one literal SQL statement.
///
/// # Example
///
/// ```
/// use sqlshift::explain;
///
/// let stmt = explain("DELETE FROM sessions WHERE expired = 1").unwrap();
/// assert_eq!(stmt.chain.methods(), vec!["delete", "where"]);
/// ```
pub fn explain(sql: &str) -> Result<gate::TranslatedStatement, error::TranslateError> {
    gate::translate_text(sql)
}
