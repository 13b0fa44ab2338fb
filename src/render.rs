//! Concrete-syntax rendering of replacement nodes.
//!
//! The core only produces structural [`Expr`]/[`Stmt`] values. Turning them
//! into text belongs to the host driver; [`FluentSyntax`] is a default that
//! covers the usual `receiver.method(args)` family of languages.

use crate::ast::{ArrayItem, Expr, Stmt};
use crate::config::RenderConfig;

/// Emits concrete syntax for a target language.
pub trait TargetSyntax {
    fn name(&self) -> &'static str;

    fn emit_expr(&self, expr: &Expr) -> String;

    fn emit_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Assign { target, value } => {
                format!("{} = {};", self.emit_expr(target), self.emit_expr(value))
            }
            Stmt::Expr { expr } => format!("{};", self.emit_expr(expr)),
            Stmt::Return { expr: Some(expr) } => format!("return {};", self.emit_expr(expr)),
            Stmt::Return { expr: None } => "return;".to_string(),
            Stmt::Block { body } => {
                let inner: Vec<String> = body
                    .iter()
                    .flat_map(|s| {
                        self.emit_stmt(s)
                            .lines()
                            .map(|line| format!("    {}", line))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                if inner.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{\n{}\n}}", inner.join("\n"))
                }
            }
        }
    }
}

/// `receiver<access>method(args)` with configurable tokens.
#[derive(Debug, Clone, Default)]
pub struct FluentSyntax {
    config: RenderConfig,
}

impl FluentSyntax {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn quote(s: &str) -> String {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn emit_item(&self, item: &ArrayItem) -> String {
        match &item.key {
            Some(key) => format!("{} => {}", self.emit_expr(key), self.emit_expr(&item.value)),
            None => self.emit_expr(&item.value),
        }
    }
}

impl TargetSyntax for FluentSyntax {
    fn name(&self) -> &'static str {
        "fluent"
    }

    fn emit_expr(&self, expr: &Expr) -> String {
        let access = &self.config.member_access;
        let prefix = &self.config.variable_prefix;
        match expr {
            Expr::Str(s) => Self::quote(s),
            Expr::Int(n) => n.to_string(),
            Expr::Float(f) => f.to_string(),
            Expr::Bool(b) => b.to_string(),
            Expr::Null => "null".to_string(),
            Expr::Interpolated(s) => format!("\"{}\"", s),
            Expr::Concat(parts) => parts
                .iter()
                .map(|p| self.emit_expr(p))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", self.config.concat_operator)),
            Expr::Var(name) => format!("{}{}", prefix, name),
            Expr::Prop(path) => match path.split_first() {
                Some((root, rest)) if !rest.is_empty() => {
                    format!("{}{}{}{}", prefix, root, access, rest.join(access))
                }
                Some((root, _)) => format!("{}{}", prefix, root),
                None => String::new(),
            },
            Expr::Const(name) | Expr::Opaque(name) => name.clone(),
            Expr::Array(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(|i| self.emit_item(i))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Call(call) => format!(
                "{}{}{}({})",
                self.emit_expr(&call.receiver),
                access,
                call.method,
                call.args
                    .iter()
                    .map(|a| self.emit_expr(a))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn php() -> FluentSyntax {
        FluentSyntax::new(RenderConfig {
            member_access: "->".to_string(),
            variable_prefix: "$".to_string(),
            concat_operator: ".".to_string(),
        })
    }

    #[test]
    fn test_default_fluent() {
        let expr = Expr::call(
            Expr::call(Expr::var("qb"), "select", vec![Expr::str("*")]),
            "from",
            vec![Expr::str("users"), Expr::str("u")],
        );
        assert_eq!(
            FluentSyntax::default().emit_expr(&expr),
            "qb.select('*').from('users', 'u')"
        );
    }

    #[test]
    fn test_php_tokens() {
        let expr = Expr::call(
            Expr::call(Expr::prop("this.db"), "createQueryBuilder", vec![]),
            "setParameters",
            vec![Expr::map(vec![("param1", Expr::Int(25)), ("param2", Expr::str("John"))])],
        );
        assert_eq!(
            php().emit_expr(&expr),
            "$this->db->createQueryBuilder()->setParameters(['param1' => 25, 'param2' => 'John'])"
        );
    }

    #[test]
    fn test_statements() {
        let stmt = Stmt::assign(Expr::var("rows"), Expr::call(Expr::var("stmt"), "fetchAllAssociative", vec![]));
        assert_eq!(php().emit_stmt(&stmt), "$rows = $stmt->fetchAllAssociative();");

        let block = Stmt::Block {
            body: vec![Stmt::Return { expr: None }],
        };
        assert_eq!(php().emit_stmt(&block), "{\n    return;\n}");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(
            FluentSyntax::default().emit_expr(&Expr::str("name = 'O\\'Hara'")),
            "'name = \\'O\\\\\\'Hara\\''"
        );
        assert_eq!(
            php().emit_expr(&Expr::Concat(vec![Expr::str("a"), Expr::var("b")])),
            "'a' . $b"
        );
    }
}
