//! Statement builders.
//!
//! Each builder maps one [`ClauseSet`] variant onto an ordered list of
//! query-builder calls. The chain is method names plus literal arguments;
//! it becomes an expression only when attached to a builder source with
//! [`CallChain::attach`].
//!
//! | Statement | Chain |
//! |-----------|-------|
//! | SELECT | `select` `distinct`? `from`+ joins* where* `groupBy`/`addGroupBy`* having* `orderBy`/`addOrderBy`* `setMaxResults`? `setFirstResult`? |
//! | INSERT | `insert` `values` |
//! | UPDATE | `update` `set`+ where* |
//! | DELETE | `delete` joins* where* |

mod delete;
mod insert;
mod predicates;
mod select;
mod update;

use serde::Serialize;

use crate::ast::Expr;
use crate::parser::{ClauseSet, Join, JoinKind, TableRef};

/// One builder call: method name and literal arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuilderCall {
    pub method: String,
    pub args: Vec<Expr>,
}

/// Ordered builder calls emitted for one statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CallChain {
    calls: Vec<BuilderCall>,
}

impl CallChain {
    fn push(&mut self, method: &str, args: Vec<Expr>) {
        self.calls.push(BuilderCall {
            method: method.to_string(),
            args,
        });
    }

    pub fn calls(&self) -> &[BuilderCall] {
        &self.calls
    }

    /// Method names in order, handy for assertions and reports.
    pub fn methods(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.method.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Hang the chain off `base`, innermost call first.
    pub fn attach(&self, base: Expr) -> Expr {
        self.calls
            .iter()
            .fold(base, |recv, call| Expr::call(recv, &call.method, call.args.clone()))
    }
}

/// Build the call chain for a parsed statement.
pub fn build(clauses: &ClauseSet) -> CallChain {
    let mut chain = CallChain::default();
    match clauses {
        ClauseSet::Select(c) => select::build(&mut chain, c),
        ClauseSet::Insert(c) => insert::build(&mut chain, c),
        ClauseSet::Update(c) => update::build(&mut chain, c),
        ClauseSet::Delete(c) => delete::build(&mut chain, c),
    }
    chain
}

/// `(table)` or `(table, alias)`.
fn table_args(table: &TableRef) -> Vec<Expr> {
    let mut args = vec![Expr::str(&table.name)];
    if let Some(alias) = &table.alias {
        args.push(Expr::str(alias));
    }
    args
}

/// `innerJoin(fromAlias, table, alias, condition)` and friends.
fn push_joins(chain: &mut CallChain, from_alias: &str, joins: &[Join]) {
    for join in joins {
        let method = match join.kind {
            JoinKind::Inner => "innerJoin",
            JoinKind::Left => "leftJoin",
            JoinKind::Right => "rightJoin",
        };
        chain.push(
            method,
            vec![
                Expr::str(from_alias),
                Expr::str(&join.table.name),
                Expr::str(join.table.reference()),
                Expr::str(&join.condition),
            ],
        );
    }
}
