//! Whitespace normalization, placeholder renumbering and statement classification.

use std::fmt;

use serde::Serialize;

use crate::error::TranslateError;

/// Statement kind, derived from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Unknown,
}

impl StatementKind {
    /// Whether executing the statement returns rows.
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Placeholders a statement expects to be bound.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Placeholders {
    #[default]
    None,
    /// `?` markers, renumbered to `:param1..:paramN`.
    Positional(usize),
    /// Distinct `:name` markers in order of first occurrence.
    Named(Vec<String>),
}

impl Placeholders {
    pub fn len(&self) -> usize {
        match self {
            Placeholders::None => 0,
            Placeholders::Positional(n) => *n,
            Placeholders::Named(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builder parameter names, in binding order.
    pub fn names(&self) -> Vec<String> {
        match self {
            Placeholders::None => Vec::new(),
            Placeholders::Positional(n) => (1..=*n).map(positional_name).collect(),
            Placeholders::Named(names) => names.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Placeholders::None => false,
            Placeholders::Positional(n) => name
                .strip_prefix("param")
                .and_then(|k| k.parse::<usize>().ok())
                .is_some_and(|k| k >= 1 && k <= *n),
            Placeholders::Named(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Name given to the K-th positional placeholder (1-based).
pub fn positional_name(k: usize) -> String {
    format!("param{}", k)
}

/// Normalized SQL text.
///
/// Whitespace-collapsed, a single trailing `;` removed, and every `?`
/// rewritten to `:paramK` in occurrence order. Built once per extracted
/// literal and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlText {
    text: String,
    placeholders: Placeholders,
}

impl SqlText {
    pub fn new(raw: &str) -> Result<Self, TranslateError> {
        let collapsed = normalize(raw);
        let collapsed = collapsed
            .strip_suffix(';')
            .map(|s| s.trim_end().to_string())
            .unwrap_or(collapsed);
        let placeholders = inventory(&collapsed)?;
        let text = renumber_placeholders(&collapsed);
        Ok(Self { text, placeholders })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    pub fn kind(&self) -> StatementKind {
        classify(&self.text)
    }
}

impl fmt::Display for SqlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

/// Collapse whitespace runs outside quoted sections to one space and trim.
///
/// Quoted content is copied verbatim; collapsing inside a string literal
/// would change the value the database sees.
pub fn normalize(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for c in sql.trim().chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if is_quote(c) {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}

/// Replace each `?` outside quotes with `:paramK`, K counting from 1.
///
/// The counter is local to this call: every statement starts at `:param1`.
pub fn renumber_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut counter = 0usize;

    for c in sql.chars() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '?' => {
                counter += 1;
                out.push(':');
                out.push_str(&positional_name(counter));
            }
            q if is_quote(q) => {
                quote = Some(q);
                out.push(q);
            }
            other => out.push(other),
        }
    }
    out
}

/// Classify by the case-insensitive leading keyword.
pub fn classify(sql: &str) -> StatementKind {
    let word: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match word.to_ascii_uppercase().as_str() {
        "SELECT" => StatementKind::Select,
        "INSERT" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        _ => StatementKind::Unknown,
    }
}

/// Leading word of the text, for diagnostics.
pub fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace().next().unwrap_or_default().to_string()
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Inventory the placeholders of un-renumbered text.
///
/// Mixing `?` with `:name` in one statement cannot be bound consistently
/// and is rejected.
pub fn inventory(sql: &str) -> Result<Placeholders, TranslateError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut positional = 0usize;
    let mut named: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if is_quote(c) {
            quote = Some(c);
        } else if c == '?' {
            positional += 1;
        } else if c == ':' {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let after_cast = prev == Some(':') || prev.is_some_and(is_ident_char);
            if !after_cast && next.is_some_and(is_ident_start) {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                if !named.contains(&name) {
                    named.push(name);
                }
                i = end;
                continue;
            }
        }
        i += 1;
    }

    match (positional, named.is_empty()) {
        (0, true) => Ok(Placeholders::None),
        (n, true) => Ok(Placeholders::Positional(n)),
        (0, false) => Ok(Placeholders::Named(named)),
        _ => Err(TranslateError::mismatch(
            "statement mixes positional and named placeholders",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize("  SELECT *\n\tFROM   users\n WHERE id = 1  "),
            "SELECT * FROM users WHERE id = 1"
        );
    }

    #[test]
    fn test_normalize_keeps_quoted_whitespace() {
        assert_eq!(
            normalize("SELECT * FROM t WHERE name = 'a   b'"),
            "SELECT * FROM t WHERE name = 'a   b'"
        );
    }

    #[test]
    fn test_renumber_in_occurrence_order() {
        assert_eq!(
            renumber_placeholders("SELECT * FROM t WHERE a = ? AND b = ? OR c IN (?, ?)"),
            "SELECT * FROM t WHERE a = :param1 AND b = :param2 OR c IN (:param3, :param4)"
        );
    }

    #[test]
    fn test_renumber_skips_quoted_question_marks() {
        assert_eq!(
            renumber_placeholders("SELECT '?' AS q FROM t WHERE a = ?"),
            "SELECT '?' AS q FROM t WHERE a = :param1"
        );
    }

    #[test]
    fn test_renumber_counter_is_per_statement() {
        let first = renumber_placeholders("UPDATE t SET a = ? WHERE b = ?");
        let second = renumber_placeholders("DELETE FROM t WHERE c = ?");
        assert!(first.contains(":param2"));
        assert_eq!(second, "DELETE FROM t WHERE c = :param1");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("SELECT 1"), StatementKind::Select);
        assert_eq!(classify("select 1"), StatementKind::Select);
        assert_eq!(classify("Insert INTO t VALUES (1)"), StatementKind::Insert);
        assert_eq!(classify("update t SET a = 1"), StatementKind::Update);
        assert_eq!(classify("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(classify("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Unknown);
        assert_eq!(classify("SELECTED"), StatementKind::Unknown);
        assert_eq!(classify(""), StatementKind::Unknown);
    }

    #[test]
    fn test_inventory() {
        assert_eq!(inventory("SELECT 1").unwrap(), Placeholders::None);
        assert_eq!(
            inventory("SELECT * FROM t WHERE a = ? AND b = ?").unwrap(),
            Placeholders::Positional(2)
        );
        assert_eq!(
            inventory("SELECT * FROM t WHERE a = :id OR b = :id AND c = :name").unwrap(),
            Placeholders::Named(vec!["id".to_string(), "name".to_string()])
        );
        assert_eq!(
            inventory("SELECT a::text FROM t WHERE b = '10:30'").unwrap(),
            Placeholders::None
        );
        assert!(inventory("SELECT * FROM t WHERE a = ? AND b = :b").is_err());
    }

    #[test]
    fn test_sql_text() {
        let sql = SqlText::new("SELECT *\n FROM users WHERE age > ? AND name = ?;").unwrap();
        assert_eq!(
            sql.as_str(),
            "SELECT * FROM users WHERE age > :param1 AND name = :param2"
        );
        assert_eq!(sql.placeholders(), &Placeholders::Positional(2));
        assert_eq!(sql.kind(), StatementKind::Select);
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            Placeholders::Positional(2).names(),
            vec!["param1".to_string(), "param2".to_string()]
        );
        assert!(Placeholders::Positional(2).contains("param2"));
        assert!(!Placeholders::Positional(2).contains("param3"));
        assert!(!Placeholders::Positional(2).contains("param0"));
    }
}
