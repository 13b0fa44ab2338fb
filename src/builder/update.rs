use super::predicates::{self, WHERE};
use super::{CallChain, table_args};
use crate::ast::Expr;
use crate::parser::UpdateClauses;

pub(super) fn build(chain: &mut CallChain, clauses: &UpdateClauses) {
    chain.push("update", table_args(&clauses.table));
    for a in &clauses.assignments {
        chain.push("set", vec![Expr::str(&a.column), Expr::str(&a.value)]);
    }
    if let Some(filter) = &clauses.where_clause {
        predicates::push_filter(chain, &WHERE, filter);
    }
}
