//! SELECT chain.

use super::predicates::{self, HAVING, WHERE};
use super::{CallChain, push_joins, table_args};
use crate::ast::Expr;
use crate::parser::SelectClauses;

pub(super) fn build(chain: &mut CallChain, clauses: &SelectClauses) {
    chain.push(
        "select",
        clauses.columns.iter().map(Expr::str).collect(),
    );
    if clauses.distinct {
        chain.push("distinct", vec![]);
    }

    for table in &clauses.from {
        chain.push("from", table_args(table));
    }
    if let Some(first) = clauses.from.first() {
        push_joins(chain, first.reference(), &clauses.joins);
    }

    if let Some(filter) = &clauses.where_clause {
        predicates::push_filter(chain, &WHERE, filter);
    }

    for (i, expr) in clauses.group_by.iter().enumerate() {
        let method = if i == 0 { "groupBy" } else { "addGroupBy" };
        chain.push(method, vec![Expr::str(expr)]);
    }

    if let Some(having) = &clauses.having {
        predicates::push_filter(chain, &HAVING, having);
    }

    for (i, item) in clauses.order_by.iter().enumerate() {
        let method = if i == 0 { "orderBy" } else { "addOrderBy" };
        chain.push(
            method,
            vec![Expr::str(&item.expr), Expr::str(item.direction.as_sql())],
        );
    }

    if let Some(limit) = clauses.limit {
        chain.push("setMaxResults", vec![Expr::Int(limit)]);
    }
    if let Some(offset) = clauses.offset {
        chain.push("setFirstResult", vec![Expr::Int(offset)]);
    }
}
