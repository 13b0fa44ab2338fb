use super::CallChain;
use crate::ast::Expr;
use crate::parser::InsertClauses;

pub(super) fn build(chain: &mut CallChain, clauses: &InsertClauses) {
    chain.push("insert", vec![Expr::str(&clauses.table)]);
    chain.push(
        "values",
        vec![Expr::map(
            clauses
                .values
                .iter()
                .map(|a| (a.column.as_str(), Expr::str(&a.value)))
                .collect(),
        )],
    );
}
