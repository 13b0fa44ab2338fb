//! Keyword and identifier parsers.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{Direction, JoinKind, TableRef};
use crate::error::TranslateError;

/// Clause keywords recognized at top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Select,
    Insert,
    Update,
    Delete,
    From,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Join(JoinKind),
    On,
    Set,
    Values,
    /// A clause the builders cannot express.
    Unsupported(&'static str),
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Case-insensitive keyword that must end at a word boundary.
fn kw<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), peek(not(satisfy(is_ident_char))))
}

fn join_keyword(input: &str) -> IResult<&str, Keyword> {
    let outer = || opt(pair(kw("OUTER"), multispace1));
    alt((
        value(
            Keyword::Join(JoinKind::Inner),
            tuple((kw("INNER"), multispace1, kw("JOIN"))),
        ),
        value(
            Keyword::Join(JoinKind::Left),
            tuple((kw("LEFT"), multispace1, outer(), kw("JOIN"))),
        ),
        value(
            Keyword::Join(JoinKind::Right),
            tuple((kw("RIGHT"), multispace1, outer(), kw("JOIN"))),
        ),
        value(Keyword::Join(JoinKind::Inner), kw("JOIN")),
        value(
            Keyword::Unsupported("FULL JOIN"),
            tuple((kw("FULL"), multispace1, outer(), kw("JOIN"))),
        ),
        value(
            Keyword::Unsupported("CROSS JOIN"),
            tuple((kw("CROSS"), multispace1, kw("JOIN"))),
        ),
        value(Keyword::Unsupported("NATURAL JOIN"), kw("NATURAL")),
        value(Keyword::Unsupported("STRAIGHT_JOIN"), kw("STRAIGHT_JOIN")),
    ))(input)
}

fn unsupported_keyword(input: &str) -> IResult<&str, Keyword> {
    alt((
        value(Keyword::Unsupported("UNION"), kw("UNION")),
        value(Keyword::Unsupported("INTERSECT"), kw("INTERSECT")),
        value(Keyword::Unsupported("EXCEPT"), kw("EXCEPT")),
        value(Keyword::Unsupported("INTO"), kw("INTO")),
        value(Keyword::Unsupported("USING"), kw("USING")),
        value(Keyword::Unsupported("RETURNING"), kw("RETURNING")),
        value(Keyword::Unsupported("WINDOW"), kw("WINDOW")),
        value(Keyword::Unsupported("FOR"), kw("FOR")),
        value(Keyword::Unsupported("LOCK"), kw("LOCK")),
        value(Keyword::Unsupported("WITH"), kw("WITH")),
        value(Keyword::Unsupported("DUPLICATE"), kw("DUPLICATE")),
        value(Keyword::Unsupported("FETCH"), kw("FETCH")),
    ))(input)
}

/// Recognize a clause keyword at the start of `input`.
pub(crate) fn keyword(input: &str) -> IResult<&str, Keyword> {
    alt((
        value(
            Keyword::GroupBy,
            tuple((kw("GROUP"), multispace1, kw("BY"))),
        ),
        value(
            Keyword::OrderBy,
            tuple((kw("ORDER"), multispace1, kw("BY"))),
        ),
        join_keyword,
        alt((
            value(Keyword::Select, kw("SELECT")),
            value(
                Keyword::Insert,
                pair(kw("INSERT"), opt(pair(multispace1, kw("INTO")))),
            ),
            value(Keyword::Update, kw("UPDATE")),
            value(Keyword::Delete, kw("DELETE")),
            value(Keyword::From, kw("FROM")),
            value(Keyword::Where, kw("WHERE")),
            value(Keyword::Having, kw("HAVING")),
            value(Keyword::Limit, kw("LIMIT")),
            value(Keyword::Offset, kw("OFFSET")),
            value(Keyword::On, kw("ON")),
            value(Keyword::Set, kw("SET")),
            value(Keyword::Values, kw("VALUES")),
        )),
        unsupported_keyword,
    ))(input)
}

fn bare_ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| is_ident_char(c) || c == '$'),
    ))(input)
}

fn quoted_ident(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(delimited(char('`'), take_while1(|c: char| c != '`'), char('`'))),
        recognize(delimited(char('"'), take_while1(|c: char| c != '"'), char('"'))),
    ))(input)
}

/// Possibly schema-qualified, possibly quoted identifier: `db.users`, `` `order` ``.
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), alt((bare_ident, quoted_ident))))(input)
}

fn alias(input: &str) -> IResult<&str, &str> {
    preceded(opt(pair(kw("AS"), multispace1)), identifier)(input)
}

fn table_ref(input: &str) -> IResult<&str, TableRef> {
    map(
        pair(identifier, opt(preceded(multispace1, alias))),
        |(name, alias)| TableRef {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        },
    )(input)
}

fn whole<'a, O>(
    what: &str,
    input: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O, TranslateError> {
    all_consuming(delimited(multispace0, parser, multispace0))(input)
        .map(|(_, out)| out)
        .map_err(|_| TranslateError::unsupported(format!("{} '{}'", what, input.trim())))
}

/// Parse `name [[AS] alias]`, rejecting anything else (subqueries, functions).
pub(crate) fn parse_table_ref(input: &str) -> Result<TableRef, TranslateError> {
    whole("table reference", input, table_ref)
}

/// Parse a plain column name.
pub(crate) fn parse_column(input: &str) -> Result<String, TranslateError> {
    whole("column", input, identifier).map(str::to_string)
}

/// Leading `DISTINCT` of a select list. Returns the remaining list.
pub(crate) fn strip_distinct(input: &str) -> (bool, &str) {
    match terminated(kw("DISTINCT"), multispace1)(input.trim_start()) {
        Ok((rest, _)) => (true, rest),
        Err(_) => (false, input),
    }
}

/// Unsigned integer literal that fits a builder `int` argument.
fn number(input: &str) -> IResult<&str, i64> {
    map_res(digit1, str::parse::<i64>)(input)
}

/// `LIMIT n` or MySQL `LIMIT offset, n`. Returns `(offset, limit)`.
pub(crate) fn parse_limit(input: &str) -> Result<(Option<i64>, i64), TranslateError> {
    whole(
        "LIMIT",
        input,
        alt((
            map(
                tuple((number, multispace0, char(','), multispace0, number)),
                |(offset, _, _, _, limit)| (Some(offset), limit),
            ),
            map(number, |limit| (None, limit)),
        )),
    )
}

pub(crate) fn parse_offset(input: &str) -> Result<i64, TranslateError> {
    whole("OFFSET", input, number)
}

fn order_modifier(input: &str) -> IResult<&str, &str> {
    alt((kw("ASC"), kw("DESC"), kw("NULLS"), kw("FIRST"), kw("LAST")))(input)
}

/// Split an ORDER BY item into expression and direction (ASC when absent).
///
/// Anything left after the direction (`NULLS FIRST`, a doubled direction)
/// has no builder argument and is rejected.
pub(crate) fn parse_order_item(item: &str) -> Result<(String, Direction), TranslateError> {
    let item = item.trim();
    let (expr, direction) = match item.rsplit_once(char::is_whitespace) {
        Some((head, last)) => {
            let dir: IResult<&str, Direction> = all_consuming(alt((
                value(Direction::Asc, kw("ASC")),
                value(Direction::Desc, kw("DESC")),
            )))(last);
            match dir {
                Ok((_, dir)) => (head.trim(), dir),
                Err(_) => (item, Direction::Asc),
            }
        }
        None => (item, Direction::Asc),
    };
    if expr.is_empty() {
        return Err(TranslateError::unsupported("empty ORDER BY item"));
    }
    if let Some((_, last)) = expr.rsplit_once(char::is_whitespace)
        && all_consuming(order_modifier)(last).is_ok()
    {
        return Err(TranslateError::unsupported(format!(
            "ORDER BY modifier in '{}'",
            item
        )));
    }
    Ok((expr.to_string(), direction))
}
