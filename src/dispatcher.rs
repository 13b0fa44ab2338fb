//! Call-site classification and rewriting.
//!
//! The dispatcher walks one statement at a time, in source order, and
//! consults the unit's [`TranslationScope`] for every receiver it meets.
//! Recognized call shapes:
//!
//! | Call | Receiver | Rewrite |
//! |------|----------|---------|
//! | `prepare(sql)` | connection | builder chain |
//! | `query(sql)` / `exec(sql)` | connection | builder chain + execute |
//! | `execute([..])` | builder chain | `setParameters` + execute |
//! | `bindValue(k, v)` | builder chain | `setParameter` |
//! | `fetch` / `fetchAll` / `fetchColumn` | builder chain (SELECT) | fetch-mode call |
//!
//! Everything else passes through; its receiver and arguments are still
//! visited so nested call sites are found.

use crate::ast::{ArrayItem, Expr, MethodCall, Stmt};
use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::gate::{self, TranslatedStatement};
use crate::normalizer::StatementKind;
use crate::params::{ParameterMap, bind_key};
use crate::scope::{ChainInfo, Origin, Stage, TranslationScope};

/// Outcome of visiting one expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Visited {
    /// New expression, or `None` when the node stays as written.
    pub replacement: Option<Expr>,
    /// What the expression evaluates to.
    pub origin: Origin,
}

impl Visited {
    fn unchanged(origin: Origin) -> Self {
        Self {
            replacement: None,
            origin,
        }
    }

    fn replaced(expr: Expr, origin: Origin) -> Self {
        Self {
            replacement: Some(expr),
            origin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Assoc,
    Num,
    Column,
}

fn fetch_mode(expr: &Expr) -> Option<FetchMode> {
    let Expr::Const(name) = expr else {
        return None;
    };
    if name.ends_with("FETCH_ASSOC") {
        Some(FetchMode::Assoc)
    } else if name.ends_with("FETCH_NUM") {
        Some(FetchMode::Num)
    } else if name.ends_with("FETCH_COLUMN") {
        Some(FetchMode::Column)
    } else {
        None
    }
}

/// Builder fetch method for a `fetch`-family call (method already lowercased).
fn fetch_method(method: &str, args: &[Expr]) -> Result<&'static str, TranslateError> {
    let mode = match args {
        [mode] => Some(mode),
        _ => None,
    };
    let resolved = match (method, args.len(), mode.map(|m| (m, fetch_mode(m)))) {
        ("fetch", 0, _) => Some("fetchAssociative"),
        ("fetch", 1, Some((_, Some(FetchMode::Assoc)))) => Some("fetchAssociative"),
        ("fetch", 1, Some((_, Some(FetchMode::Num)))) => Some("fetchNumeric"),
        ("fetchall", 0, _) => Some("fetchAllAssociative"),
        ("fetchall", 1, Some((_, Some(FetchMode::Assoc)))) => Some("fetchAllAssociative"),
        ("fetchall", 1, Some((_, Some(FetchMode::Num)))) => Some("fetchAllNumeric"),
        ("fetchall", 1, Some((_, Some(FetchMode::Column)))) => Some("fetchFirstColumn"),
        ("fetchcolumn", 0, _) => Some("fetchOne"),
        ("fetchcolumn", 1, Some((Expr::Int(0), _))) => Some("fetchOne"),
        _ => None,
    };
    resolved.ok_or_else(|| {
        TranslateError::UnsupportedCall(format!("{}() with this fetch mode", method))
    })
}

fn execute_method(kind: StatementKind) -> &'static str {
    if kind.returns_rows() {
        "executeQuery"
    } else {
        "executeStatement"
    }
}

/// Short human-readable name of a call site for diagnostics.
fn describe_call(call: &MethodCall) -> String {
    let receiver = match &call.receiver {
        Expr::Call(inner) => describe_call(inner),
        other => other.identity().unwrap_or_else(|| "<expr>".to_string()),
    };
    format!("{}.{}()", receiver, call.method)
}

pub(crate) struct Dispatcher<'a> {
    config: &'a TranslatorConfig,
    scope: &'a mut TranslationScope,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(config: &'a TranslatorConfig, scope: &'a mut TranslationScope) -> Self {
        Self { config, scope }
    }

    /// Visit a leaf statement. Returns the replacement, if any.
    ///
    /// Blocks are the driver's business and come back unchanged.
    pub(crate) fn visit_stmt(&mut self, stmt: &Stmt) -> Option<Stmt> {
        match stmt {
            Stmt::Assign { target, value } => {
                let visited = self.visit_expr(value);
                self.scope.bind(target, visited.origin);
                visited.replacement.map(|value| Stmt::Assign {
                    target: target.clone(),
                    value,
                })
            }
            Stmt::Expr { expr } => self
                .visit_expr(expr)
                .replacement
                .map(|expr| Stmt::Expr { expr }),
            Stmt::Return { expr: Some(expr) } => self
                .visit_expr(expr)
                .replacement
                .map(|expr| Stmt::Return { expr: Some(expr) }),
            Stmt::Return { expr: None } | Stmt::Block { .. } => None,
        }
    }

    pub(crate) fn visit_expr(&mut self, expr: &Expr) -> Visited {
        match expr {
            Expr::Var(_) | Expr::Prop(_) => Visited::unchanged(self.scope.lookup(expr).clone()),
            Expr::Call(call) => self.visit_call(call),
            Expr::Array(items) => {
                let mut changed = false;
                let items = items
                    .iter()
                    .map(|item| {
                        let value = self.visit_expr(&item.value);
                        changed |= value.replacement.is_some();
                        ArrayItem {
                            key: item.key.clone(),
                            value: value.replacement.unwrap_or_else(|| item.value.clone()),
                        }
                    })
                    .collect();
                if changed {
                    Visited::replaced(Expr::Array(items), Origin::Unknown)
                } else {
                    Visited::default()
                }
            }
            Expr::Concat(parts) => match self.visit_all(parts) {
                Some(parts) => Visited::replaced(Expr::Concat(parts), Origin::Unknown),
                None => Visited::default(),
            },
            _ => Visited::default(),
        }
    }

    /// Visit a list of expressions; `Some` when any of them changed.
    fn visit_all(&mut self, exprs: &[Expr]) -> Option<Vec<Expr>> {
        let visited: Vec<Visited> = exprs.iter().map(|e| self.visit_expr(e)).collect();
        if visited.iter().all(|v| v.replacement.is_none()) {
            return None;
        }
        Some(
            visited
                .into_iter()
                .zip(exprs)
                .map(|(v, original)| v.replacement.unwrap_or_else(|| original.clone()))
                .collect(),
        )
    }

    /// A connection is a configured name that this unit has not reassigned
    /// to something else.
    fn is_connection(&self, expr: &Expr) -> bool {
        self.config.is_connection(expr) && *self.scope.lookup(expr) == Origin::Unknown
    }

    fn visit_call(&mut self, call: &MethodCall) -> Visited {
        let method = call.method.to_ascii_lowercase();
        match method.as_str() {
            "prepare" if self.is_connection(&call.receiver) => self.visit_prepare(call),
            "query" | "exec" if self.is_connection(&call.receiver) => {
                self.visit_direct(call, method == "exec")
            }
            "execute" => self.visit_execute(call),
            "bindvalue" => self.visit_bind_value(call),
            "fetch" | "fetchall" | "fetchcolumn" => self.visit_fetch(call, &method),
            _ => self.pass_through(call),
        }
    }

    fn translate(&mut self, call: &MethodCall) -> Option<TranslatedStatement> {
        let result = match call.args.as_slice() {
            [sql] => gate::translate_sql(sql),
            _ => Err(TranslateError::UnsupportedCall(format!(
                "{}() with extra arguments",
                call.method
            ))),
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.scope.note(describe_call(call), &err);
                None
            }
        }
    }

    fn builder_source(&self, connection: &Expr) -> Expr {
        self.config.builder_access.source(connection)
    }

    fn visit_prepare(&mut self, call: &MethodCall) -> Visited {
        let Some(stmt) = self.translate(call) else {
            return Visited::unchanged(Origin::RawHandle);
        };
        let chain = stmt.chain.attach(self.builder_source(&call.receiver));
        tracing::debug!("{}: prepare -> {} builder", self.scope.unit(), stmt.kind);
        Visited::replaced(
            chain,
            Origin::BuilderChain(ChainInfo {
                kind: stmt.kind,
                placeholders: stmt.sql.placeholders().clone(),
                stage: Stage::Prepared,
            }),
        )
    }

    /// `query(sql)` / `exec(sql)`: build and execute in one step.
    fn visit_direct(&mut self, call: &MethodCall, exec: bool) -> Visited {
        let Some(stmt) = self.translate(call) else {
            return Visited::unchanged(Origin::RawHandle);
        };
        let refusal = if !stmt.sql.placeholders().is_empty() {
            Some(TranslateError::mismatch("placeholders in a directly executed statement"))
        } else if exec && stmt.kind.returns_rows() {
            Some(TranslateError::UnsupportedCall("exec() of a SELECT".to_string()))
        } else {
            None
        };
        if let Some(err) = refusal {
            self.scope.note(describe_call(call), &err);
            return Visited::unchanged(Origin::RawHandle);
        }

        let chain = stmt.chain.attach(self.builder_source(&call.receiver));
        Visited::replaced(
            Expr::call(chain, execute_method(stmt.kind), vec![]),
            Origin::BuilderChain(ChainInfo {
                kind: stmt.kind,
                placeholders: stmt.sql.placeholders().clone(),
                stage: Stage::Executed,
            }),
        )
    }

    /// Visit the receiver and return its chain info when it is a builder
    /// chain that has not been executed yet.
    fn prepared_receiver(&mut self, call: &MethodCall) -> Result<(Expr, ChainInfo), Visited> {
        let receiver = self.visit_expr(&call.receiver);
        match receiver.origin.chain().cloned() {
            Some(info) if info.stage == Stage::Prepared => {
                Ok((receiver.replacement.unwrap_or_else(|| call.receiver.clone()), info))
            }
            Some(_) => {
                self.scope.note(
                    describe_call(call),
                    &TranslateError::UnsupportedCall(format!(
                        "{}() on an already executed statement",
                        call.method
                    )),
                );
                Err(Visited::unchanged(Origin::RawHandle))
            }
            None => Err(self.rebuild(call, receiver)),
        }
    }

    fn visit_execute(&mut self, call: &MethodCall) -> Visited {
        let (base, info) = match self.prepared_receiver(call) {
            Ok(found) => found,
            Err(visited) => return visited,
        };

        let params = match ParameterMap::from_execute_args(&call.args, &info.placeholders) {
            Ok(params) => params,
            Err(err) => {
                self.scope.note(describe_call(call), &err);
                return Visited::unchanged(Origin::RawHandle);
            }
        };

        let mut expr = base;
        if !params.is_empty() {
            expr = Expr::call(expr, "setParameters", vec![params.to_expr()]);
        }
        expr = Expr::call(expr, execute_method(info.kind), vec![]);
        tracing::debug!(
            "{}: execute with {} parameters",
            self.scope.unit(),
            params.len()
        );
        Visited::replaced(
            expr,
            Origin::BuilderChain(ChainInfo {
                stage: Stage::Executed,
                ..info
            }),
        )
    }

    fn visit_bind_value(&mut self, call: &MethodCall) -> Visited {
        let (base, info) = match self.prepared_receiver(call) {
            Ok(found) => found,
            Err(visited) => return visited,
        };

        let result = match call.args.as_slice() {
            [key, value, rest @ ..] if rest.len() <= 1 => {
                bind_key(key, &info.placeholders).map(|name| {
                    let mut args = vec![Expr::Str(name), value.clone()];
                    args.extend(rest.iter().cloned());
                    args
                })
            }
            _ => Err(TranslateError::UnsupportedCall(
                "bindValue() takes a key, a value and an optional type".to_string(),
            )),
        };

        match result {
            Ok(args) => Visited::replaced(
                Expr::call(base, "setParameter", args),
                Origin::BuilderChain(info),
            ),
            Err(err) => {
                self.scope.note(describe_call(call), &err);
                Visited::unchanged(Origin::RawHandle)
            }
        }
    }

    fn visit_fetch(&mut self, call: &MethodCall, method: &str) -> Visited {
        let receiver = self.visit_expr(&call.receiver);
        let Some(info) = receiver.origin.chain().cloned() else {
            return self.rebuild(call, receiver);
        };

        let result = if info.kind.returns_rows() {
            fetch_method(method, &call.args)
        } else {
            Err(TranslateError::UnsupportedCall(format!(
                "{}() on a {} statement",
                call.method, info.kind
            )))
        };

        match result {
            Ok(fetch) => {
                let base = receiver
                    .replacement
                    .unwrap_or_else(|| call.receiver.clone());
                Visited::replaced(Expr::call(base, fetch, vec![]), Origin::Unknown)
            }
            Err(err) => {
                self.scope.note(describe_call(call), &err);
                Visited::unchanged(Origin::Unknown)
            }
        }
    }

    /// An unrecognized call, or a recognized one on a receiver that is not a
    /// builder chain.
    fn pass_through(&mut self, call: &MethodCall) -> Visited {
        let receiver = self.visit_expr(&call.receiver);
        self.rebuild(call, receiver)
    }

    /// Keep the call itself, carrying over rewrites found in its receiver and
    /// arguments. A freshly translated chain is never left dangling under a
    /// method it has no counterpart for.
    fn rebuild(&mut self, call: &MethodCall, receiver: Visited) -> Visited {
        let subject = describe_call(call);
        let receiver_replacement = match (receiver.origin.chain(), receiver.replacement) {
            (Some(_), Some(_)) => {
                self.scope.note(
                    subject,
                    &TranslateError::UnsupportedCall(format!(
                        "{}() has no builder counterpart",
                        call.method
                    )),
                );
                None
            }
            (Some(_), None) => {
                if call.method.eq_ignore_ascii_case("bindParam") {
                    self.scope.note(
                        subject,
                        &TranslateError::UnsupportedCall(
                            "bindParam() binds by reference".to_string(),
                        ),
                    );
                } else {
                    self.scope.note(
                        subject,
                        &TranslateError::UnsupportedCall(format!(
                            "{}() has no builder counterpart",
                            call.method
                        )),
                    );
                }
                None
            }
            (None, replacement) => replacement,
        };

        let args = self.visit_all(&call.args);
        if receiver_replacement.is_none() && args.is_none() {
            return Visited::default();
        }
        Visited::replaced(
            Expr::call(
                receiver_replacement.unwrap_or_else(|| call.receiver.clone()),
                &call.method,
                args.unwrap_or_else(|| call.args.clone()),
            ),
            Origin::Unknown,
        )
    }
}
