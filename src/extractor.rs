//! Pull literal SQL text out of an argument expression.

use crate::ast::Expr;

/// Return the SQL string carried by `expr`, if it is derivable at compile time.
///
/// Accepts string literals and concatenations whose every part is a string
/// or integer literal (or a nested constant concatenation). Variables,
/// interpolated strings, constants, calls and anything opaque yield `None`.
pub fn extract_sql(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Str(s) => Some(s.clone()),
        Expr::Concat(parts) => {
            let mut sql = String::new();
            for part in parts {
                match part {
                    Expr::Int(n) => sql.push_str(&n.to_string()),
                    other => sql.push_str(&extract_sql(other)?),
                }
            }
            Some(sql)
        }
        _ => None,
    }
}
