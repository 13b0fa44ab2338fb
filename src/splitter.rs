//! Quote- and parenthesis-aware boolean predicate splitter.
//!
//! Splits a WHERE/HAVING expression at its top-level `AND`/`OR` keywords.
//! Parenthesized groups and quoted text are opaque: nothing inside them is
//! ever a split point. Malformed input is never rejected, it comes back as a
//! single unsplit predicate.

use std::fmt;

use serde::Serialize;

use crate::error::TranslateError;

/// Operator joining a predicate to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Joiner {
    None,
    And,
    Or,
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Joiner::None => f.write_str("-"),
            Joiner::And => f.write_str("AND"),
            Joiner::Or => f.write_str("OR"),
        }
    }
}

/// A contiguous sub-expression and the operator that joins it to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub text: String,
    pub joiner: Joiner,
}

impl Predicate {
    pub fn new(text: impl Into<String>, joiner: Joiner) -> Self {
        Self {
            text: text.into(),
            joiner,
        }
    }

    fn whole(text: &str) -> Self {
        Self::new(text.trim(), Joiner::None)
    }
}

/// Split `expression` into ordered predicates.
///
/// The first predicate always carries [`Joiner::None`]. When no top-level
/// boundary exists, or the input is malformed, the trimmed expression is
/// returned as the only element.
pub fn split(expression: &str) -> Vec<Predicate> {
    let trimmed = expression.trim();
    match scan(trimmed) {
        Ok(predicates) if predicates.len() > 1 => predicates,
        Ok(_) => vec![Predicate::whole(trimmed)],
        Err(err) => {
            tracing::debug!("Not splitting '{}': {}", trimmed, err);
            vec![Predicate::whole(trimmed)]
        }
    }
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when the whole expression sits inside one balanced outer pair of parentheses.
fn is_wrapped(chars: &[char]) -> bool {
    if chars.first() != Some(&'(') {
        return false;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if let Some(q) = quote {
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
            q if is_quote(q) => quote = Some(q),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == chars.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Match ` AND ` / ` OR ` starting at the whitespace at `i`.
///
/// Returns the joiner and the index just past the trailing whitespace.
fn joiner_at(chars: &[char], i: usize) -> Option<(Joiner, usize)> {
    let mut j = i;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    if j == i {
        return None;
    }
    let start = j;
    while j < chars.len() && is_word_char(chars[j]) {
        j += 1;
    }
    let word: String = chars[start..j].iter().collect();
    let joiner = match word.to_ascii_uppercase().as_str() {
        "AND" => Joiner::And,
        "OR" => Joiner::Or,
        _ => return None,
    };
    let after_word = j;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    if j == after_word || j == chars.len() {
        return None;
    }
    Some((joiner, j))
}

/// Single left-to-right scan. Errors only on malformed input.
pub(crate) fn scan(expression: &str) -> Result<Vec<Predicate>, TranslateError> {
    let chars: Vec<char> = expression.chars().collect();
    if is_wrapped(&chars) {
        return Ok(vec![Predicate::whole(expression)]);
    }

    let mut predicates = Vec::new();
    let mut current = String::new();
    let mut pending = Joiner::None;
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    // CASE ... END bodies and the AND of BETWEEN x AND y are not boundaries.
    let mut case_depth = 0usize;
    let mut in_between = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            current.push(c);
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
            current.push(c);
            i += 1;
            continue;
        }

        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(TranslateError::MalformedBooleanExpression(
                        "unbalanced ')'".to_string(),
                    ));
                }
            }
            _ => {}
        }

        if depth == 0 && c.is_ascii_alphabetic() && (i == 0 || !is_word_char(chars[i - 1])) {
            let start = i;
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            match word.to_ascii_uppercase().as_str() {
                "CASE" => case_depth += 1,
                "END" => case_depth = case_depth.saturating_sub(1),
                "BETWEEN" if case_depth == 0 => in_between = true,
                // A joiner with nothing on one side.
                "AND" | "OR"
                    if case_depth == 0
                        && (current.trim().is_empty() || i == chars.len()) =>
                {
                    return Err(TranslateError::MalformedBooleanExpression(format!(
                        "dangling {}",
                        word.to_ascii_uppercase()
                    )));
                }
                _ => {}
            }
            current.push_str(&word);
            continue;
        }

        if depth == 0
            && case_depth == 0
            && c.is_whitespace()
            && let Some((joiner, next)) = joiner_at(&chars, i)
        {
            if in_between && joiner == Joiner::And {
                // Keep `AND` as part of the BETWEEN range.
                in_between = false;
                current.extend(&chars[i..next]);
                i = next;
                continue;
            }
            let text = current.trim();
            if text.is_empty() {
                return Err(TranslateError::MalformedBooleanExpression(format!(
                    "empty predicate before {}",
                    joiner
                )));
            }
            predicates.push(Predicate::new(text, pending));
            current.clear();
            pending = joiner;
            i = next;
            continue;
        }

        current.push(c);
        i += 1;
    }

    if quote.is_some() {
        return Err(TranslateError::MalformedBooleanExpression(
            "unterminated quote".to_string(),
        ));
    }
    if depth != 0 {
        return Err(TranslateError::MalformedBooleanExpression(
            "unbalanced '('".to_string(),
        ));
    }

    let text = current.trim();
    if text.is_empty() {
        return Err(TranslateError::MalformedBooleanExpression(
            "dangling operator".to_string(),
        ));
    }
    predicates.push(Predicate::new(text, pending));
    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(predicates: &[Predicate]) -> Vec<(&str, Joiner)> {
        predicates
            .iter()
            .map(|p| (p.text.as_str(), p.joiner))
            .collect()
    }

    #[test]
    fn test_and_or_chain() {
        let result = split("a = 1 AND b = 2 OR c = 3");
        assert_eq!(
            pairs(&result),
            vec![("a = 1", Joiner::None), ("b = 2", Joiner::And), ("c = 3", Joiner::Or)]
        );
    }

    #[test]
    fn test_parenthesized_group_is_opaque() {
        let result = split("(a = 1 OR b = 2) AND c = 3");
        assert_eq!(
            pairs(&result),
            vec![("(a = 1 OR b = 2)", Joiner::None), ("c = 3", Joiner::And)]
        );
    }

    #[test]
    fn test_quoted_keyword_is_not_a_boundary() {
        let result = split("name = 'A AND B' AND x = 1");
        assert_eq!(
            pairs(&result),
            vec![("name = 'A AND B'", Joiner::None), ("x = 1", Joiner::And)]
        );
    }

    #[test]
    fn test_atomic_input_is_returned_trimmed() {
        let result = split("  status = 'active'  ");
        assert_eq!(pairs(&result), vec![("status = 'active'", Joiner::None)]);
    }

    #[test]
    fn test_fully_wrapped_expression_is_not_split() {
        let result = split("(a = 1 AND b = 2)");
        assert_eq!(pairs(&result), vec![("(a = 1 AND b = 2)", Joiner::None)]);
    }

    #[test]
    fn test_two_groups_are_not_treated_as_wrapped() {
        let result = split("(a = 1) OR (b = 2)");
        assert_eq!(
            pairs(&result),
            vec![("(a = 1)", Joiner::None), ("(b = 2)", Joiner::Or)]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let result = split("a = 1 and b = 2 Or c = 3");
        assert_eq!(result.len(), 3);
        assert_eq!(result[1].joiner, Joiner::And);
        assert_eq!(result[2].joiner, Joiner::Or);
    }

    #[test]
    fn test_keyword_needs_surrounding_whitespace() {
        let result = split("brand = 1 AND order_id = 2");
        assert_eq!(
            pairs(&result),
            vec![("brand = 1", Joiner::None), ("order_id = 2", Joiner::And)]
        );
        assert_eq!(split("android = 1").len(), 1);
    }

    #[test]
    fn test_between_range_is_kept_whole() {
        let result = split("age BETWEEN 18 AND 65 AND active = 1");
        assert_eq!(
            pairs(&result),
            vec![("age BETWEEN 18 AND 65", Joiner::None), ("active = 1", Joiner::And)]
        );
    }

    #[test]
    fn test_case_body_is_opaque() {
        let result = split("CASE WHEN a = 1 AND b = 2 THEN 1 ELSE 0 END = 1 OR c = 3");
        assert_eq!(
            pairs(&result),
            vec![
                ("CASE WHEN a = 1 AND b = 2 THEN 1 ELSE 0 END = 1", Joiner::None),
                ("c = 3", Joiner::Or)
            ]
        );
    }

    #[test]
    fn test_escaped_quote_inside_literal() {
        let result = split(r"name = 'it\'s AND more' OR id = 2");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, r"name = 'it\'s AND more'");
    }

    #[test]
    fn test_unbalanced_input_degrades_to_single_predicate() {
        let input = "(a = 1 AND b = 2";
        assert_eq!(pairs(&split(input)), vec![(input, Joiner::None)]);

        let input = "name = 'open AND x = 1";
        assert_eq!(pairs(&split(input)), vec![(input, Joiner::None)]);

        assert!(scan("a = 1) AND (b = 2").is_err());
    }

    #[test]
    fn test_empty_predicate_is_malformed() {
        let input = "a = 1 AND  AND b = 2";
        assert!(scan(input).is_err());
        assert_eq!(split(input).len(), 1);
    }

    #[test]
    fn test_subquery_is_opaque() {
        let result = split("id IN (SELECT user_id FROM bans WHERE a = 1 OR b = 2) AND x = 1");
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].text, "x = 1");
    }
}
