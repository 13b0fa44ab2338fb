//! Clause-level SQL parser.
//!
//! Breaks normalized SQL into the clause categories the builders understand.
//! Clause keywords are only recognized outside quotes and parentheses, so
//! subqueries and string literals ride along as opaque text. Any clause the
//! builders cannot express aborts the whole statement.
//!
//! ```text
//! SELECT a, b FROM users u LEFT JOIN x ON x.id = u.x WHERE ... ORDER BY a DESC LIMIT 10
//! ──┬───       ─┬────────  ─┬──────────────────────  ──┬───  ─────┬──────  ───┬────
//!   │           │           │                          │         │           └── limit/offset
//!   │           │           │                          │         └── ordering
//!   │           │           │                          └── predicates (split later)
//!   │           │           └── joins
//!   │           └── source tables
//!   └── columns
//! ```

mod dml;
mod scan;
mod select;
mod tokens;

use serde::Serialize;

use crate::error::TranslateError;
use crate::normalizer::{SqlText, StatementKind, leading_keyword};

use tokens::Keyword;

/// A table with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            name: name.into(),
            alias: alias.map(str::to_string),
        }
    }

    /// The name other clauses use to refer to this table.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub expr: String,
    pub direction: Direction,
}

/// `column = expression`, used by UPDATE ... SET and INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectClauses {
    pub distinct: bool,
    pub columns: Vec<String>,
    pub from: Vec<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<String>,
    pub group_by: Vec<String>,
    pub having: Option<String>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertClauses {
    pub table: String,
    pub values: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateClauses {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteClauses {
    pub table: TableRef,
    pub joins: Vec<Join>,
    pub where_clause: Option<String>,
}

/// Parsed clauses, one variant per supported statement kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "statement", rename_all = "lowercase")]
pub enum ClauseSet {
    Select(SelectClauses),
    Insert(InsertClauses),
    Update(UpdateClauses),
    Delete(DeleteClauses),
}

impl ClauseSet {
    pub fn kind(&self) -> StatementKind {
        match self {
            ClauseSet::Select(_) => StatementKind::Select,
            ClauseSet::Insert(_) => StatementKind::Insert,
            ClauseSet::Update(_) => StatementKind::Update,
            ClauseSet::Delete(_) => StatementKind::Delete,
        }
    }
}

/// Parse normalized SQL into its clause set.
pub fn parse_clauses(sql: &SqlText) -> Result<ClauseSet, TranslateError> {
    let text = sql.as_str();
    match sql.kind() {
        StatementKind::Select => select::parse_select(text).map(ClauseSet::Select),
        StatementKind::Insert => dml::parse_insert(text).map(ClauseSet::Insert),
        StatementKind::Update => dml::parse_update(text).map(ClauseSet::Update),
        StatementKind::Delete => dml::parse_delete(text).map(ClauseSet::Delete),
        StatementKind::Unknown => Err(TranslateError::UnknownStatementKind(leading_keyword(text))),
    }
}

/// A clause keyword and the text up to the next clause keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    keyword: Keyword,
    body: &'a str,
}

/// Cut `sql` at every top-level clause keyword.
fn segments(sql: &str) -> Result<Vec<Segment<'_>>, TranslateError> {
    let mut marks: Vec<(usize, usize, Keyword)> = Vec::new();
    let mut resume = 0;

    for pos in scan::top_level_words(sql)? {
        if pos < resume {
            continue;
        }
        if let Ok((rest, keyword)) = tokens::keyword(&sql[pos..]) {
            let end = sql.len() - rest.len();
            marks.push((pos, end, keyword));
            resume = end;
        }
    }

    if marks.first().map(|m| m.0) != Some(0) {
        return Err(TranslateError::unsupported(
            "statement does not start with a clause keyword",
        ));
    }

    let mut out = Vec::with_capacity(marks.len());
    for (i, &(_, end, keyword)) in marks.iter().enumerate() {
        if let Keyword::Unsupported(name) = keyword {
            return Err(TranslateError::unsupported(name));
        }
        let next = marks.get(i + 1).map(|m| m.0).unwrap_or(sql.len());
        out.push(Segment {
            keyword,
            body: sql[end..next].trim(),
        });
    }
    Ok(out)
}

/// Clause ordering guard: each clause must come after the previous one.
struct ClauseOrder {
    rank: u8,
}

impl ClauseOrder {
    fn new() -> Self {
        Self { rank: 0 }
    }

    fn advance(&mut self, rank: u8, clause: &str) -> Result<(), TranslateError> {
        if rank <= self.rank {
            return Err(TranslateError::unsupported(format!(
                "{} is repeated or out of order",
                clause
            )));
        }
        self.rank = rank;
        Ok(())
    }

    /// Like `advance` but allows repeats of the same rank (joins).
    fn repeatable(&mut self, rank: u8, clause: &str) -> Result<(), TranslateError> {
        if rank < self.rank {
            return Err(TranslateError::unsupported(format!("{} is out of order", clause)));
        }
        self.rank = rank;
        Ok(())
    }
}

fn non_empty<'a>(body: &'a str, clause: &str) -> Result<&'a str, TranslateError> {
    if body.is_empty() {
        Err(TranslateError::unsupported(format!("empty {} clause", clause)))
    } else {
        Ok(body)
    }
}

/// Split a comma list, rejecting empty items.
fn comma_list<'a>(body: &'a str, clause: &str) -> Result<Vec<&'a str>, TranslateError> {
    let items = scan::split_top_level(non_empty(body, clause)?, ',')?;
    if items.iter().any(|item| item.is_empty()) {
        return Err(TranslateError::unsupported(format!("empty item in {}", clause)));
    }
    Ok(items)
}

/// Consume a JOIN segment and the ON segment that must follow it.
fn parse_join<'a>(
    kind: JoinKind,
    body: &str,
    rest: &mut std::iter::Peekable<impl Iterator<Item = Segment<'a>>>,
) -> Result<Join, TranslateError> {
    let table = tokens::parse_table_ref(body)?;
    let on = rest
        .next_if(|seg| seg.keyword == Keyword::On)
        .ok_or_else(|| TranslateError::unsupported("JOIN without ON"))?;
    Ok(Join {
        kind,
        table,
        condition: non_empty(on.body, "ON")?.to_string(),
    })
}

/// Parse `col = expr, col = expr`.
fn parse_assignments(body: &str) -> Result<Vec<Assignment>, TranslateError> {
    comma_list(body, "SET")?
        .into_iter()
        .map(|item| {
            let (column, value) = item
                .split_once('=')
                .ok_or_else(|| TranslateError::unsupported(format!("assignment '{}'", item)))?;
            Ok(Assignment {
                column: tokens::parse_column(column)?,
                value: non_empty(value.trim(), "assignment value")?.to_string(),
            })
        })
        .collect()
}
