//! The translate-or-pass-through decision.
//!
//! Every SQL literal that becomes a builder chain goes through
//! [`translate_sql`]. Any error here means the call site stays exactly as
//! written.

use serde::Serialize;

use crate::ast::Expr;
use crate::builder::{self, CallChain};
use crate::error::TranslateError;
use crate::extractor::extract_sql;
use crate::normalizer::{SqlText, StatementKind, leading_keyword};
use crate::parser::{ClauseSet, parse_clauses};

/// A statement that is safe to rewrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedStatement {
    #[serde(serialize_with = "serialize_sql")]
    pub sql: SqlText,
    pub kind: StatementKind,
    pub clauses: ClauseSet,
    pub chain: CallChain,
}

fn serialize_sql<S: serde::Serializer>(sql: &SqlText, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(sql.as_str())
}

/// Translate the SQL argument of a prepare/query call.
pub fn translate_sql(arg: &Expr) -> Result<TranslatedStatement, TranslateError> {
    let raw = extract_sql(arg).ok_or(TranslateError::ExtractionFailure)?;
    translate_text(&raw)
}

/// Translate SQL text that is already known to be literal.
pub fn translate_text(raw: &str) -> Result<TranslatedStatement, TranslateError> {
    let sql = SqlText::new(raw)?;
    let kind = sql.kind();
    if kind == StatementKind::Unknown {
        return Err(TranslateError::UnknownStatementKind(
            leading_keyword(sql.as_str()),
        ));
    }

    let clauses = parse_clauses(&sql)?;
    let chain = builder::build(&clauses);
    tracing::debug!("Translated {} into {} builder calls", kind, chain.len());

    Ok(TranslatedStatement {
        sql,
        kind,
        clauses,
        chain,
    })
}
