use std::io::Write;

use sqlshift::prelude::*;

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("sqlshift-config-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "connection_variables = [\"link\"]").unwrap();
        writeln!(file, "fuzzy_detection = false").unwrap();
        writeln!(file, "[builder_access]").unwrap();
        writeln!(file, "method = \"getQueryBuilder\"").unwrap();
    }

    let config = TranslatorConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.connection_variables, vec!["link".to_string()]);
    assert_eq!(
        config.builder_access,
        BuilderAccess::Method("getQueryBuilder".to_string())
    );

    let unit = Unit::new(
        "Repo::all",
        vec![
            Stmt::assign(
                Expr::var("a"),
                Expr::call(Expr::var("link"), "prepare", vec![Expr::str("SELECT * FROM t")]),
            ),
            Stmt::assign(
                Expr::var("b"),
                Expr::call(Expr::var("pdo"), "prepare", vec![Expr::str("SELECT * FROM t")]),
            ),
        ],
    );
    let outcome = Translator::new(config).translate_unit(&unit);
    assert_eq!(outcome.rewrites.len(), 1);
    assert_eq!(
        FluentSyntax::default().emit_stmt(&outcome.unit.body[0]),
        "a = link.getQueryBuilder().select('*').from('t');"
    );
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = TranslatorConfig::load("/nonexistent/sqlshift/config.toml");
    assert!(matches!(result, Err(ShiftError::Io(_))));
}
