//! Quote- and parenthesis-aware scanning helpers for clause segmentation.

use crate::error::TranslateError;

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn unbalanced() -> TranslateError {
    TranslateError::unsupported("unbalanced quotes or parentheses")
}

/// Walk `s` and call `visit(byte_offset, char, depth)` for every character
/// outside quoted sections. `depth` is the parenthesis depth before the char.
fn walk(s: &str, mut visit: impl FnMut(usize, char, usize)) -> Result<(), TranslateError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
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
        visit(i, c, depth);
        match c {
            q if is_quote(q) => quote = Some(q),
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or_else(unbalanced)?,
            _ => {}
        }
    }

    if quote.is_some() || depth != 0 {
        return Err(unbalanced());
    }
    Ok(())
}

/// Byte offsets of every word that starts outside quotes and parentheses.
///
/// Qualified names (`t.order`) and placeholders (`:limit`) do not start words.
pub(crate) fn top_level_words(s: &str) -> Result<Vec<usize>, TranslateError> {
    let mut words = Vec::new();
    let mut prev: Option<char> = None;
    walk(s, |i, c, depth| {
        let boundary = !prev.is_some_and(|p| is_ident_char(p) || matches!(p, '.' | ':' | '@' | '$'));
        if depth == 0 && boundary && (c.is_ascii_alphabetic() || c == '_') {
            words.push(i);
        }
        prev = Some(c);
    })?;
    Ok(words)
}

/// Split on `sep` where it occurs outside quotes and parentheses. Pieces are trimmed.
pub(crate) fn split_top_level(s: &str, sep: char) -> Result<Vec<&str>, TranslateError> {
    let mut cuts = Vec::new();
    walk(s, |i, c, depth| {
        if depth == 0 && c == sep {
            cuts.push(i);
        }
    })?;

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(s[start..cut].trim());
        start = cut + sep.len_utf8();
    }
    pieces.push(s[start..].trim());
    Ok(pieces)
}

/// Content of `s` when it is exactly one balanced parenthesized group.
pub(crate) fn wrapped_inner(s: &str) -> Option<&str> {
    let s = s.trim();
    if !s.starts_with('(') || !s.ends_with(')') {
        return None;
    }
    let mut first_close: Option<usize> = None;
    walk(s, |i, c, depth| {
        if c == ')' && depth == 1 && first_close.is_none() {
            first_close = Some(i);
        }
    })
    .ok()?;
    match first_close {
        Some(i) if i == s.len() - 1 => Some(s[1..i].trim()),
        _ => None,
    }
}
