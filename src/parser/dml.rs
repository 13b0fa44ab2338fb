//! INSERT, UPDATE and DELETE clause parsing.

use super::scan::wrapped_inner;
use super::tokens::{self, Keyword};
use super::{
    Assignment, ClauseOrder, DeleteClauses, InsertClauses, UpdateClauses, comma_list,
    non_empty, parse_assignments, parse_join, segments,
};
use crate::error::TranslateError;

/// `INSERT INTO t (a, b) VALUES (x, y)` or `INSERT INTO t SET a = x, b = y`.
pub(super) fn parse_insert(sql: &str) -> Result<InsertClauses, TranslateError> {
    let segs = segments(sql)?;
    let [head, body] = segs.as_slice() else {
        return Err(TranslateError::unsupported(
            "INSERT must be a single VALUES row or SET list",
        ));
    };
    if head.keyword != Keyword::Insert {
        return Err(TranslateError::unsupported("expected INSERT"));
    }

    match body.keyword {
        Keyword::Values => {
            let target = non_empty(head.body, "INSERT")?;
            let split_at = target
                .find('(')
                .ok_or_else(|| TranslateError::unsupported("INSERT without column list"))?;
            let table = tokens::parse_column(&target[..split_at])?;
            let columns = wrapped_inner(&target[split_at..])
                .ok_or_else(|| TranslateError::unsupported("malformed INSERT column list"))?;
            let columns = comma_list(columns, "INSERT columns")?
                .into_iter()
                .map(tokens::parse_column)
                .collect::<Result<Vec<_>, _>>()?;

            let row = wrapped_inner(body.body)
                .ok_or_else(|| TranslateError::unsupported("INSERT must have exactly one VALUES row"))?;
            let values = comma_list(row, "VALUES")?;
            if values.len() != columns.len() {
                return Err(TranslateError::unsupported(format!(
                    "INSERT has {} columns but {} values",
                    columns.len(),
                    values.len()
                )));
            }

            Ok(InsertClauses {
                table,
                values: columns
                    .into_iter()
                    .zip(values)
                    .map(|(column, value)| Assignment {
                        column,
                        value: value.to_string(),
                    })
                    .collect(),
            })
        }
        Keyword::Set => Ok(InsertClauses {
            table: tokens::parse_column(head.body)?,
            values: parse_assignments(body.body)?,
        }),
        other => Err(TranslateError::unsupported(format!("{:?} in INSERT", other))),
    }
}

/// `UPDATE t [alias] SET a = x, b = y [WHERE ...]`
pub(super) fn parse_update(sql: &str) -> Result<UpdateClauses, TranslateError> {
    let segs = segments(sql)?;
    let (head, set, filter) = match segs.as_slice() {
        [head, set] => (head, set, None),
        [head, set, filter] if filter.keyword == Keyword::Where => (head, set, Some(filter)),
        _ => {
            return Err(TranslateError::unsupported(
                "UPDATE supports only SET and WHERE",
            ));
        }
    };
    if head.keyword != Keyword::Update || set.keyword != Keyword::Set {
        return Err(TranslateError::unsupported("expected UPDATE ... SET"));
    }

    Ok(UpdateClauses {
        table: tokens::parse_table_ref(non_empty(head.body, "UPDATE")?)?,
        assignments: parse_assignments(set.body)?,
        where_clause: filter
            .map(|f| non_empty(f.body, "WHERE").map(str::to_string))
            .transpose()?,
    })
}

/// `DELETE FROM t [alias] [WHERE ...]`, or the multi-table form
/// `DELETE alias FROM t alias JOIN ... ON ... [WHERE ...]`.
pub(super) fn parse_delete(sql: &str) -> Result<DeleteClauses, TranslateError> {
    let mut segs = segments(sql)?.into_iter().peekable();
    let mut order = ClauseOrder::new();

    let head = segs
        .next()
        .filter(|seg| seg.keyword == Keyword::Delete)
        .ok_or_else(|| TranslateError::unsupported("expected DELETE"))?;
    let target = head.body;

    let from = segs
        .next()
        .filter(|seg| seg.keyword == Keyword::From)
        .ok_or_else(|| TranslateError::unsupported("DELETE without FROM"))?;
    let table = tokens::parse_table_ref(non_empty(from.body, "FROM")?)?;

    let mut joins = Vec::new();
    let mut where_clause = None;
    while let Some(seg) = segs.next() {
        match seg.keyword {
            Keyword::Join(kind) => {
                order.repeatable(1, "JOIN")?;
                joins.push(parse_join(kind, seg.body, &mut segs)?);
            }
            Keyword::Where => {
                order.advance(2, "WHERE")?;
                where_clause = Some(non_empty(seg.body, "WHERE")?.to_string());
            }
            other => {
                return Err(TranslateError::unsupported(format!("{:?} in DELETE", other)));
            }
        }
    }

    if !target.is_empty() {
        let target = tokens::parse_column(target)?;
        if target != table.reference() && target != table.name {
            return Err(TranslateError::unsupported(format!(
                "DELETE target '{}' is not the FROM table",
                target
            )));
        }
    } else if !joins.is_empty() {
        return Err(TranslateError::unsupported("multi-table DELETE without target"));
    }

    Ok(DeleteClauses {
        table,
        joins,
        where_clause,
    })
}
