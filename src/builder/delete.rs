use super::predicates::{self, WHERE};
use super::{CallChain, push_joins, table_args};
use crate::parser::DeleteClauses;

pub(super) fn build(chain: &mut CallChain, clauses: &DeleteClauses) {
    chain.push("delete", table_args(&clauses.table));
    push_joins(chain, clauses.table.reference(), &clauses.joins);
    if let Some(filter) = &clauses.where_clause {
        predicates::push_filter(chain, &WHERE, filter);
    }
}
