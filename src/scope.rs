//! Per-unit variable state.
//!
//! A [`TranslationScope`] lives for exactly one compilation unit. It maps
//! every variable or property path the dispatcher has seen assigned to what
//! that slot now holds:
//!
//! ```text
//!            prepare(literal) ok            prepare(...) failed
//! Unknown ───────────────────────▶ BuilderChain      Unknown ─────────▶ RawHandle
//!
//! only a new assignment to the same identity moves it again
//! ```
//!
//! A block may or may not run, so a slot that leaves a block holding
//! something other than what it held on entry becomes a [`Origin::RawHandle`].

use std::collections::HashMap;

use serde::Serialize;

use crate::ast::Expr;
use crate::error::TranslateError;
use crate::normalizer::{Placeholders, StatementKind};

/// Whether a builder chain has already been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    /// Built from `prepare`; parameters may still be bound.
    Prepared,
    /// Built from `query`/`exec` or a chained execute; only fetches remain.
    Executed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub kind: StatementKind,
    pub placeholders: Placeholders,
    pub stage: Stage,
}

/// What a tracked slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Unknown,
    /// A translated query-builder chain.
    BuilderChain(ChainInfo),
    /// A low-level statement handle that was left untranslated.
    RawHandle,
}

impl Origin {
    pub fn chain(&self) -> Option<&ChainInfo> {
        match self {
            Origin::BuilderChain(info) => Some(info),
            _ => None,
        }
    }

    pub fn statement_kind(&self) -> Option<StatementKind> {
        self.chain().map(|info| info.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub identity: String,
    #[serde(flatten)]
    pub origin: Origin,
}

/// A call site that was left unchanged, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub subject: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct TranslationScope {
    unit: String,
    bindings: HashMap<String, VariableBinding>,
    diagnostics: Vec<Diagnostic>,
}

impl TranslationScope {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Current origin of `expr`. Untracked slots are [`Origin::Unknown`].
    pub fn lookup(&self, expr: &Expr) -> &Origin {
        static UNKNOWN: Origin = Origin::Unknown;
        expr.identity()
            .and_then(|id| self.bindings.get(&id))
            .map(|b| &b.origin)
            .unwrap_or(&UNKNOWN)
    }

    pub fn is_tracked(&self, expr: &Expr) -> bool {
        expr.identity().is_some_and(|id| self.bindings.contains_key(&id))
    }

    /// Record an assignment. Replaces whatever the slot held before.
    pub(crate) fn bind(&mut self, target: &Expr, origin: Origin) {
        let Some(identity) = target.identity() else {
            return;
        };
        tracing::debug!("{}: {} -> {:?}", self.unit, identity, origin);
        self.bindings.insert(
            identity.clone(),
            VariableBinding { identity, origin },
        );
    }

    /// Origins of every tracked slot, taken on entry to a block.
    pub(crate) fn snapshot(&self) -> HashMap<String, Origin> {
        self.bindings
            .iter()
            .map(|(id, binding)| (id.clone(), binding.origin.clone()))
            .collect()
    }

    /// Reconcile slots on exit from a block entered at `before`.
    pub(crate) fn merge_branch(&mut self, before: &HashMap<String, Origin>) {
        for (id, binding) in &mut self.bindings {
            let prior = before.get(id).unwrap_or(&Origin::Unknown);
            if *prior != binding.origin && binding.origin != Origin::RawHandle {
                tracing::debug!("{}: {} differs across paths, no longer tracked", self.unit, id);
                binding.origin = Origin::RawHandle;
            }
        }
    }

    pub(crate) fn note(&mut self, subject: impl Into<String>, error: &TranslateError) {
        let diagnostic = Diagnostic {
            subject: subject.into(),
            reason: error.to_string(),
        };
        tracing::warn!("{}: left unchanged {} ({})", self.unit, diagnostic.subject, diagnostic.reason);
        self.diagnostics.push(diagnostic);
    }

    pub fn bindings(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.values()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(kind: StatementKind) -> Origin {
        Origin::BuilderChain(ChainInfo {
            kind,
            placeholders: Placeholders::None,
            stage: Stage::Prepared,
        })
    }

    #[test]
    fn test_untracked_is_unknown() {
        let scope = TranslationScope::new("unit");
        assert_eq!(scope.lookup(&Expr::var("stmt")), &Origin::Unknown);
        assert_eq!(scope.lookup(&Expr::str("stmt")), &Origin::Unknown);
        assert!(!scope.is_tracked(&Expr::var("stmt")));
    }

    #[test]
    fn test_reassignment_resets() {
        let mut scope = TranslationScope::new("unit");
        let stmt = Expr::var("stmt");
        scope.bind(&stmt, chain(StatementKind::Select));
        assert_eq!(
            scope.lookup(&stmt).statement_kind(),
            Some(StatementKind::Select)
        );

        scope.bind(&stmt, Origin::RawHandle);
        assert_eq!(scope.lookup(&stmt), &Origin::RawHandle);

        scope.bind(&stmt, Origin::Unknown);
        assert_eq!(scope.lookup(&stmt), &Origin::Unknown);
        assert!(scope.is_tracked(&stmt));
    }

    #[test]
    fn test_variables_and_properties_are_separate() {
        let mut scope = TranslationScope::new("unit");
        scope.bind(&Expr::var("stmt"), Origin::RawHandle);
        assert_eq!(scope.lookup(&Expr::prop("this.stmt")), &Origin::Unknown);
        assert_eq!(scope.lookup(&Expr::prop("stmt")), &Origin::Unknown);
    }

    #[test]
    fn test_merge_branch_demotes_changed_slots() {
        let mut scope = TranslationScope::new("unit");
        let kept = Expr::var("kept");
        let changed = Expr::var("changed");
        let fresh = Expr::var("fresh");
        scope.bind(&kept, chain(StatementKind::Select));
        scope.bind(&changed, chain(StatementKind::Select));

        let before = scope.snapshot();
        scope.bind(&kept, chain(StatementKind::Select));
        scope.bind(&changed, chain(StatementKind::Delete));
        scope.bind(&fresh, chain(StatementKind::Update));
        scope.merge_branch(&before);

        assert_eq!(scope.lookup(&kept).statement_kind(), Some(StatementKind::Select));
        assert_eq!(scope.lookup(&changed), &Origin::RawHandle);
        assert_eq!(scope.lookup(&fresh), &Origin::RawHandle);
    }

    #[test]
    fn test_notes_collect_diagnostics() {
        let mut scope = TranslationScope::new("unit");
        scope.note("$stmt", &TranslateError::ExtractionFailure);
        assert_eq!(scope.diagnostics().len(), 1);
        assert_eq!(scope.diagnostics()[0].subject, "$stmt");
    }
}
