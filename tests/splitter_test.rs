use pretty_assertions::assert_eq;
use sqlshift::normalizer::{StatementKind, classify, renumber_placeholders};
use sqlshift::splitter::{Joiner, Predicate, split};

#[test]
fn test_and_or_sequence() {
    assert_eq!(
        split("a = 1 AND b = 2 OR c = 3"),
        vec![
            Predicate::new("a = 1", Joiner::None),
            Predicate::new("b = 2", Joiner::And),
            Predicate::new("c = 3", Joiner::Or),
        ]
    );
}

#[test]
fn test_parenthesized_group_is_opaque() {
    assert_eq!(
        split("(a = 1 OR b = 2) AND c = 3"),
        vec![
            Predicate::new("(a = 1 OR b = 2)", Joiner::None),
            Predicate::new("c = 3", Joiner::And),
        ]
    );
}

#[test]
fn test_quoted_keywords_are_not_boundaries() {
    assert_eq!(
        split("name = 'A AND B' AND x = 1"),
        vec![
            Predicate::new("name = 'A AND B'", Joiner::None),
            Predicate::new("x = 1", Joiner::And),
        ]
    );
}

#[test]
fn test_atomic_input_is_idempotent() {
    for input in ["a = 1", "  status IN ('a', 'b')  ", "(x OR y)", "price BETWEEN 1 AND 5"] {
        assert_eq!(split(input), vec![Predicate::new(input.trim(), Joiner::None)]);
    }
}

#[test]
fn test_malformed_input_is_one_predicate() {
    assert_eq!(
        split("a = '1 AND b = 2"),
        vec![Predicate::new("a = '1 AND b = 2", Joiner::None)]
    );
}

#[test]
fn test_renumbering_counts_every_placeholder() {
    let sql = "SELECT * FROM t WHERE a = ? AND b IN (?, ?) AND c = '?'";
    let renumbered = renumber_placeholders(sql);
    assert_eq!(
        renumbered,
        "SELECT * FROM t WHERE a = :param1 AND b IN (:param2, :param3) AND c = '?'"
    );
    assert_eq!(renumber_placeholders("DELETE FROM t WHERE id = ?"), "DELETE FROM t WHERE id = :param1");
}

#[test]
fn test_classify_is_total() {
    let cases = [
        ("select 1", StatementKind::Select),
        ("  INSERT INTO t VALUES (1)", StatementKind::Insert),
        ("Update t SET a = 1", StatementKind::Update),
        ("delete from t", StatementKind::Delete),
        ("WITH x AS (SELECT 1) SELECT * FROM x", StatementKind::Unknown),
        ("", StatementKind::Unknown),
    ];
    for (sql, kind) in cases {
        assert_eq!(classify(sql), kind, "{}", sql);
    }
}
