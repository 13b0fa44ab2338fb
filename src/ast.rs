//! Structural input model.
//!
//! A driver hands the translator one compilation unit at a time as a list of
//! statements. Only the shapes the translator cares about are modelled; any
//! other source construct travels as [`Expr::Opaque`] and is never touched.
//!
//! The model is serde-friendly so units can arrive as JSON:
//!
//! ```json
//! { "kind": "call", "value": {
//!     "receiver": { "kind": "var", "value": "pdo" },
//!     "method": "prepare",
//!     "args": [ { "kind": "str", "value": "SELECT * FROM users" } ] } }
//! ```

use serde::{Deserialize, Serialize};

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expr {
    /// String literal.
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// String with runtime interpolation; never a literal.
    Interpolated(String),
    /// Concatenation of sub-expressions, left to right.
    Concat(Vec<Expr>),
    /// Local variable.
    Var(String),
    /// Property path such as `this.db`, one segment per element.
    Prop(Vec<String>),
    /// Named constant (e.g. a class constant), kept as written.
    Const(String),
    Array(Vec<ArrayItem>),
    Call(Box<MethodCall>),
    /// Anything else, carried as source text.
    Opaque(String),
}

/// `receiver.method(args...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub receiver: Expr,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// One entry of an array literal; `key` is absent for list-style entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Expr>,
    pub value: Expr,
}

/// A statement inside a compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Assign { target: Expr, value: Expr },
    Expr { expr: Expr },
    Return { expr: Option<Expr> },
    /// Nested block (branch body, loop body). Shares the unit's scope; slots
    /// it reassigns are not trusted after it.
    Block { body: Vec<Stmt> },
}

/// One compilation unit, e.g. a method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Build a property path from a dotted string: `"this.db"`.
    pub fn prop(path: &str) -> Self {
        Expr::Prop(path.split('.').map(str::to_string).collect())
    }

    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(MethodCall {
            receiver,
            method: method.into(),
            args,
        }))
    }

    /// List-style array: `[a, b, c]`.
    pub fn list(values: Vec<Expr>) -> Self {
        Expr::Array(
            values
                .into_iter()
                .map(|value| ArrayItem { key: None, value })
                .collect(),
        )
    }

    /// Keyed array: `['a' => x, 'b' => y]`.
    pub fn map<K: Into<String>>(entries: Vec<(K, Expr)>) -> Self {
        Expr::Array(
            entries
                .into_iter()
                .map(|(k, value)| ArrayItem {
                    key: Some(Expr::Str(k.into())),
                    value,
                })
                .collect(),
        )
    }

    /// Stable identity key for variables and property paths.
    ///
    /// Two expressions refer to the same tracked slot exactly when their
    /// identities are equal. Everything else has no identity.
    pub fn identity(&self) -> Option<String> {
        match self {
            Expr::Var(name) => Some(format!("${}", name)),
            Expr::Prop(path) if !path.is_empty() => Some(path.join(".")),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&MethodCall> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }
}

impl Stmt {
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }
}

impl Unit {
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}
