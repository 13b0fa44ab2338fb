//! Unit-level traversal.
//!
//! [`Translator`] owns only configuration. Every compilation unit gets a
//! fresh [`TranslationScope`], so units are independent and can be handed
//! to separate threads by a caller that wants to.

use serde::Serialize;

use crate::ast::{Stmt, Unit};
use crate::config::TranslatorConfig;
use crate::dispatcher::Dispatcher;
use crate::scope::{Diagnostic, TranslationScope};

/// Result of visiting one statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRewrite {
    Unchanged,
    Replaced(Stmt),
}

impl NodeRewrite {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, NodeRewrite::Unchanged)
    }
}

/// One leaf statement that was rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rewrite {
    pub before: Stmt,
    pub after: Stmt,
}

/// Everything produced for one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    /// The unit with every rewrite applied.
    pub unit: Unit,
    pub rewrites: Vec<Rewrite>,
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.rewrites.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Fresh scope for an externally driven traversal.
    pub fn scope(&self, unit: impl Into<String>) -> TranslationScope {
        TranslationScope::new(unit)
    }

    /// Visit one statement with a caller-owned scope.
    ///
    /// For drivers that walk their own tree: call this for every statement
    /// of a unit in source order, with the same scope throughout the unit.
    pub fn visit(&self, scope: &mut TranslationScope, stmt: &Stmt) -> NodeRewrite {
        let mut rewrites = Vec::new();
        match self.visit_stmt(scope, stmt, &mut rewrites) {
            Some(stmt) => NodeRewrite::Replaced(stmt),
            None => NodeRewrite::Unchanged,
        }
    }

    /// Translate a whole unit with its own scope.
    pub fn translate_unit(&self, unit: &Unit) -> UnitOutcome {
        let mut scope = self.scope(&unit.name);
        let mut rewrites = Vec::new();
        let body = self.visit_body(&mut scope, &unit.body, &mut rewrites);

        tracing::debug!(
            "{}: {} rewrites, {} diagnostics",
            unit.name,
            rewrites.len(),
            scope.diagnostics().len()
        );

        UnitOutcome {
            unit: Unit {
                name: unit.name.clone(),
                body: body.unwrap_or_else(|| unit.body.clone()),
            },
            rewrites,
            diagnostics: scope.into_diagnostics(),
        }
    }

    pub fn translate_units(&self, units: &[Unit]) -> Vec<UnitOutcome> {
        units.iter().map(|unit| self.translate_unit(unit)).collect()
    }

    fn visit_body(
        &self,
        scope: &mut TranslationScope,
        body: &[Stmt],
        rewrites: &mut Vec<Rewrite>,
    ) -> Option<Vec<Stmt>> {
        let visited: Vec<Option<Stmt>> = body
            .iter()
            .map(|stmt| self.visit_stmt(scope, stmt, rewrites))
            .collect();
        if visited.iter().all(Option::is_none) {
            return None;
        }
        Some(
            visited
                .into_iter()
                .zip(body)
                .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                .collect(),
        )
    }

    fn visit_stmt(
        &self,
        scope: &mut TranslationScope,
        stmt: &Stmt,
        rewrites: &mut Vec<Rewrite>,
    ) -> Option<Stmt> {
        if let Stmt::Block { body } = stmt {
            let before = scope.snapshot();
            let visited = self
                .visit_body(scope, body, rewrites)
                .map(|body| Stmt::Block { body });
            scope.merge_branch(&before);
            return visited;
        }

        let replaced = Dispatcher::new(&self.config, scope).visit_stmt(stmt);
        if let Some(after) = &replaced {
            rewrites.push(Rewrite {
                before: stmt.clone(),
                after: after.clone(),
            });
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use pretty_assertions::assert_eq;

    fn prepare(var: &str, sql: &str) -> Stmt {
        Stmt::assign(
            Expr::var(var),
            Expr::call(Expr::var("pdo"), "prepare", vec![Expr::str(sql)]),
        )
    }

    fn execute(var: &str) -> Stmt {
        Stmt::expr(Expr::call(Expr::var(var), "execute", vec![]))
    }

    #[test]
    fn test_blocks_share_the_unit_scope() {
        let unit = Unit::new(
            "Repo::purge",
            vec![
                prepare("stmt", "DELETE FROM sessions WHERE expired = 1"),
                Stmt::Block {
                    body: vec![execute("stmt")],
                },
            ],
        );
        let outcome = Translator::default().translate_unit(&unit);
        assert_eq!(outcome.rewrites.len(), 2);
        let Stmt::Block { body } = &outcome.unit.body[1] else {
            panic!("block expected");
        };
        assert_eq!(
            body[0],
            Stmt::expr(Expr::call(Expr::var("stmt"), "executeStatement", vec![]))
        );
    }

    #[test]
    fn test_branch_assignments_are_not_trusted_afterwards() {
        let unit = Unit::new(
            "Repo::either",
            vec![
                Stmt::Block {
                    body: vec![Stmt::assign(
                        Expr::var("stmt"),
                        Expr::call(Expr::var("pdo"), "prepare", vec![Expr::var("sql")]),
                    )],
                },
                Stmt::Block {
                    body: vec![prepare("stmt", "SELECT * FROM t")],
                },
                execute("stmt"),
            ],
        );
        let outcome = Translator::default().translate_unit(&unit);
        assert_eq!(outcome.rewrites.len(), 1);
        assert_eq!(outcome.unit.body[2], execute("stmt"));
    }

    #[test]
    fn test_chain_used_inside_its_block_translates() {
        let unit = Unit::new(
            "Repo::loop",
            vec![
                Stmt::Block {
                    body: vec![
                        prepare("stmt", "DELETE FROM t WHERE id = 1"),
                        execute("stmt"),
                    ],
                },
                execute("stmt"),
            ],
        );
        let outcome = Translator::default().translate_unit(&unit);
        assert_eq!(outcome.rewrites.len(), 2);
        let Stmt::Block { body } = &outcome.unit.body[0] else {
            panic!("block expected");
        };
        assert_eq!(
            body[1],
            Stmt::expr(Expr::call(Expr::var("stmt"), "executeStatement", vec![]))
        );
        assert_eq!(outcome.unit.body[1], execute("stmt"));
    }

    #[test]
    fn test_units_do_not_share_state() {
        let first = Unit::new("a", vec![prepare("stmt", "DELETE FROM t")]);
        let second = Unit::new("b", vec![execute("stmt")]);
        let outcomes = Translator::default().translate_units(&[first, second]);
        assert_eq!(outcomes[0].rewrites.len(), 1);
        assert!(outcomes[1].is_unchanged());
        assert_eq!(outcomes[1].unit.body, vec![execute("stmt")]);
    }

    #[test]
    fn test_failed_unit_does_not_affect_the_next() {
        let broken = Unit::new("a", vec![prepare("stmt", "SELECT a FROM t UNION SELECT b FROM u")]);
        let fine = Unit::new("b", vec![prepare("stmt", "SELECT * FROM t")]);
        let outcomes = Translator::default().translate_units(&[broken, fine]);
        assert!(outcomes[0].is_unchanged());
        assert_eq!(outcomes[0].diagnostics.len(), 1);
        assert_eq!(outcomes[1].rewrites.len(), 1);
        assert!(outcomes[1].diagnostics.is_empty());
    }

    #[test]
    fn test_external_visit_api() {
        let translator = Translator::default();
        let mut scope = translator.scope("external");
        let first = translator.visit(&mut scope, &prepare("stmt", "SELECT * FROM t"));
        assert!(!first.is_unchanged());
        let second = translator.visit(&mut scope, &execute("stmt"));
        assert_eq!(
            second,
            NodeRewrite::Replaced(Stmt::expr(Expr::call(
                Expr::var("stmt"),
                "executeQuery",
                vec![]
            )))
        );
        assert_eq!(
            translator.visit(&mut scope, &Stmt::Return { expr: None }),
            NodeRewrite::Unchanged
        );
    }
}
