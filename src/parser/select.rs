//! SELECT clause parsing.

use super::tokens::{self, Keyword};
use super::{
    ClauseOrder, OrderItem, SelectClauses, comma_list, non_empty, parse_join, segments,
};
use crate::error::TranslateError;

const FROM: u8 = 1;
const JOIN: u8 = 2;
const WHERE: u8 = 3;
const GROUP_BY: u8 = 4;
const HAVING: u8 = 5;
const ORDER_BY: u8 = 6;
const LIMIT: u8 = 7;
const OFFSET: u8 = 8;

pub(super) fn parse_select(sql: &str) -> Result<SelectClauses, TranslateError> {
    let mut segs = segments(sql)?.into_iter().peekable();
    let mut clauses = SelectClauses::default();
    let mut order = ClauseOrder::new();

    let head = segs
        .next()
        .filter(|seg| seg.keyword == Keyword::Select)
        .ok_or_else(|| TranslateError::unsupported("expected SELECT"))?;
    let (distinct, list) = tokens::strip_distinct(head.body);
    clauses.distinct = distinct;
    clauses.columns = comma_list(list, "SELECT")?
        .into_iter()
        .map(str::to_string)
        .collect();

    while let Some(seg) = segs.next() {
        match seg.keyword {
            Keyword::From => {
                order.advance(FROM, "FROM")?;
                clauses.from = comma_list(seg.body, "FROM")?
                    .into_iter()
                    .map(tokens::parse_table_ref)
                    .collect::<Result<_, _>>()?;
            }
            Keyword::Join(kind) => {
                if clauses.from.is_empty() {
                    return Err(TranslateError::unsupported("JOIN before FROM"));
                }
                order.repeatable(JOIN, "JOIN")?;
                clauses.joins.push(parse_join(kind, seg.body, &mut segs)?);
            }
            Keyword::Where => {
                order.advance(WHERE, "WHERE")?;
                clauses.where_clause = Some(non_empty(seg.body, "WHERE")?.to_string());
            }
            Keyword::GroupBy => {
                order.advance(GROUP_BY, "GROUP BY")?;
                clauses.group_by = comma_list(seg.body, "GROUP BY")?
                    .into_iter()
                    .map(str::to_string)
                    .collect();
            }
            Keyword::Having => {
                order.advance(HAVING, "HAVING")?;
                clauses.having = Some(non_empty(seg.body, "HAVING")?.to_string());
            }
            Keyword::OrderBy => {
                order.advance(ORDER_BY, "ORDER BY")?;
                clauses.order_by = comma_list(seg.body, "ORDER BY")?
                    .into_iter()
                    .map(|item| {
                        tokens::parse_order_item(item)
                            .map(|(expr, direction)| OrderItem { expr, direction })
                    })
                    .collect::<Result<_, _>>()?;
            }
            Keyword::Limit => {
                order.advance(LIMIT, "LIMIT")?;
                let (offset, limit) = tokens::parse_limit(seg.body)?;
                clauses.limit = Some(limit);
                clauses.offset = offset;
            }
            Keyword::Offset => {
                if clauses.offset.is_some() {
                    return Err(TranslateError::unsupported("OFFSET given twice"));
                }
                order.advance(OFFSET, "OFFSET")?;
                clauses.offset = Some(tokens::parse_offset(seg.body)?);
            }
            other => {
                return Err(TranslateError::unsupported(format!(
                    "{:?} in SELECT",
                    other
                )));
            }
        }
    }

    if clauses.from.is_empty() {
        return Err(TranslateError::unsupported("SELECT without FROM"));
    }
    Ok(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Direction, JoinKind, TableRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_select() {
        let clauses = parse_select(
            "SELECT DISTINCT u.id, COUNT(o.id) AS n FROM users u \
             LEFT JOIN orders o ON o.user_id = u.id \
             WHERE u.active = 1 AND o.total > :param1 \
             GROUP BY u.id HAVING COUNT(o.id) > 2 \
             ORDER BY n DESC, u.id LIMIT 10 OFFSET 20",
        )
        .unwrap();

        assert!(clauses.distinct);
        assert_eq!(clauses.columns, vec!["u.id", "COUNT(o.id) AS n"]);
        assert_eq!(clauses.from, vec![TableRef::new("users", Some("u"))]);
        assert_eq!(clauses.joins.len(), 1);
        assert_eq!(clauses.joins[0].kind, JoinKind::Left);
        assert_eq!(clauses.joins[0].table, TableRef::new("orders", Some("o")));
        assert_eq!(clauses.joins[0].condition, "o.user_id = u.id");
        assert_eq!(
            clauses.where_clause.as_deref(),
            Some("u.active = 1 AND o.total > :param1")
        );
        assert_eq!(clauses.group_by, vec!["u.id"]);
        assert_eq!(clauses.having.as_deref(), Some("COUNT(o.id) > 2"));
        assert_eq!(
            clauses.order_by,
            vec![
                OrderItem {
                    expr: "n".to_string(),
                    direction: Direction::Desc
                },
                OrderItem {
                    expr: "u.id".to_string(),
                    direction: Direction::Asc
                },
            ]
        );
        assert_eq!(clauses.limit, Some(10));
        assert_eq!(clauses.offset, Some(20));
    }

    #[test]
    fn test_star_select() {
        let clauses = parse_select("SELECT * FROM users").unwrap();
        assert_eq!(clauses.columns, vec!["*"]);
        assert_eq!(clauses.from, vec![TableRef::new("users", None)]);
        assert_eq!(clauses.where_clause, None);
    }

    #[test]
    fn test_mysql_limit_form() {
        let clauses = parse_select("SELECT id FROM t LIMIT 5, 10").unwrap();
        assert_eq!(clauses.offset, Some(5));
        assert_eq!(clauses.limit, Some(10));
    }

    #[test]
    fn test_subquery_in_where_is_opaque() {
        let clauses =
            parse_select("SELECT id FROM t WHERE id IN (SELECT t_id FROM u ORDER BY x LIMIT 1)")
                .unwrap();
        assert_eq!(
            clauses.where_clause.as_deref(),
            Some("id IN (SELECT t_id FROM u ORDER BY x LIMIT 1)")
        );
        assert_eq!(clauses.limit, None);
    }

    #[test]
    fn test_unsupported_shapes() {
        assert!(parse_select("SELECT 1").is_err());
        assert!(parse_select("SELECT a FROM t WHERE a = 1 FROM u").is_err());
        assert!(parse_select("SELECT a FROM t ORDER BY a WHERE a = 1").is_err());
        assert!(parse_select("SELECT a FROM t JOIN u USING (id)").is_err());
        assert!(parse_select("SELECT a FROM t JOIN u").is_err());
        assert!(parse_select("SELECT a FROM (SELECT 1) x").is_err());
        assert!(parse_select("SELECT a FROM t LIMIT :param1").is_err());
        assert!(parse_select("SELECT a FROM t FOR UPDATE").is_err());
        assert!(parse_select("SELECT a FROM t WHERE").is_err());
    }

    #[test]
    fn test_limit_and_order_modifiers_fail_closed() {
        assert!(parse_select("SELECT id FROM t LIMIT 10, 18446744073709551615").is_err());
        assert!(parse_select("SELECT id FROM t ORDER BY created_at DESC NULLS LAST").is_err());
        assert!(parse_select("SELECT id FROM t ORDER BY a, x ASC NULLS FIRST").is_err());
    }

    #[test]
    fn test_joins_keep_source_order() {
        let clauses = parse_select(
            "SELECT * FROM a INNER JOIN b ON b.a = a.id RIGHT OUTER JOIN c ON c.b = b.id JOIN d ON d.c = c.id",
        )
        .unwrap();
        let kinds: Vec<JoinKind> = clauses.joins.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![JoinKind::Inner, JoinKind::Right, JoinKind::Inner]);
    }
}
