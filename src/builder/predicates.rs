//! WHERE / HAVING chains.

use super::CallChain;
use crate::ast::Expr;
use crate::splitter::{Joiner, Predicate, split};

/// Method names for one filter family.
pub(super) struct FilterMethods {
    pub first: &'static str,
    pub and: &'static str,
    pub or: &'static str,
}

pub(super) const WHERE: FilterMethods = FilterMethods {
    first: "where",
    and: "andWhere",
    or: "orWhere",
};

pub(super) const HAVING: FilterMethods = FilterMethods {
    first: "having",
    and: "andHaving",
    or: "orHaving",
};

/// A left-associative `where/andWhere/orWhere` chain reads `a OR b AND c`
/// as `(a OR b) AND c`. Any AND after an OR changes meaning.
fn chains_left_associatively(predicates: &[Predicate]) -> bool {
    let mut seen_or = false;
    for p in predicates {
        match p.joiner {
            Joiner::Or => seen_or = true,
            Joiner::And if seen_or => return false,
            _ => {}
        }
    }
    true
}

/// Emit the filter chain for `clause`.
pub(super) fn push_filter(chain: &mut CallChain, methods: &FilterMethods, clause: &str) {
    let predicates = split(clause);
    if !chains_left_associatively(&predicates) {
        tracing::debug!("Keeping '{}' as one {} call", clause, methods.first);
        chain.push(methods.first, vec![Expr::str(clause.trim())]);
        return;
    }

    for p in predicates {
        let method = match p.joiner {
            Joiner::None => methods.first,
            Joiner::And => methods.and,
            Joiner::Or => methods.or,
        };
        chain.push(method, vec![Expr::Str(p.text)]);
    }
}
