use super::*;
use crate::prompt::Console;
use pgtable::{Query, StatementKind, TableError};
use std::io;

#[derive(Default)]
struct FakeGateway {
    calls: Vec<(StatementKind, String, Vec<String>)>,
    rows: Vec<Record>,
    fail: bool,
}

impl FakeGateway {
    fn record(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        if self.fail {
            return Err(TableError::Connection("connection refused".to_string()));
        }
        self.calls.push((
            query.kind(),
            query.to_sql(),
            query.params().iter().map(|p| p.as_str().to_string()).collect(),
        ));
        Ok(self.rows.clone())
    }
}

impl Gateway for FakeGateway {
    async fn select(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.record(query)
    }

    async fn insert(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.record(query)
    }

    async fn update(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.record(query)
    }

    async fn delete(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.record(query)
    }
}

async fn run_script(script: &str, gateway: FakeGateway) -> (TableResult<()>, FakeGateway, String) {
    let console = Console::new(script.as_bytes(), Vec::new());
    let builder = QueryBuilder::new("reviews", "email_address").unwrap();
    let mut shell = Shell::new(gateway, console, builder);
    let result = shell.run().await;
    let (gateway, console) = shell.into_parts();
    let output = String::from_utf8(console.into_output()).unwrap();
    (result, gateway, output)
}

#[tokio::test]
async fn insert_reprompts_until_email_is_valid() {
    let script = "insert\nemail_address\nnot-an-email\njohn@example.com\n\n";
    let (result, gw, output) = run_script(script, FakeGateway::default()).await;

    result.unwrap();
    assert_eq!(output.matches("Enter value for email_address: ").count(), 2);
    assert_eq!(gw.calls.len(), 1);
    let (kind, sql, params) = &gw.calls[0];
    assert_eq!(*kind, StatementKind::Insert);
    assert_eq!(
        sql,
        r#"INSERT INTO "reviews" ("email_address") VALUES ($1) RETURNING *"#
    );
    assert_eq!(params, &vec!["john@example.com".to_string()]);
}

#[tokio::test]
async fn configured_email_field_is_the_one_validated() {
    let console = Console::new(
        "insert\nemail_address\nfree text\ncontact\nbad\nsam@example.org\n\n".as_bytes(),
        Vec::new(),
    );
    let builder = QueryBuilder::new("reviews", "email_address").unwrap();
    let mut shell = Shell::new(FakeGateway::default(), console, builder).with_config(ShellConfig {
        email_field: "contact".to_string(),
    });
    shell.run().await.unwrap();

    let (gw, console) = shell.into_parts();
    let output = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(output.matches("Enter value for contact: ").count(), 2);
    assert_eq!(gw.calls[0].2, vec!["free text", "sam@example.org"]);
}

#[tokio::test]
async fn insert_prints_returned_rows() {
    let gateway = FakeGateway {
        rows: vec![Record::from_pairs([
            ("reviewer_name", "John Doe"),
            ("email_address", "john@example.com"),
        ])],
        ..FakeGateway::default()
    };
    let script = "insert\nreviewer_name\nJohn Doe\nemail_address\njohn@example.com\n\n";
    let (result, gw, output) = run_script(script, gateway).await;

    result.unwrap();
    assert_eq!(gw.calls[0].2, vec!["John Doe", "john@example.com"]);
    assert!(output.contains("John Doe"));
}

#[tokio::test]
async fn insert_without_pairs_is_a_no_op() {
    let (result, gw, _) = run_script("insert\n\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn update_without_key_never_reaches_gateway() {
    let script = "update\n\nreview_rating\n5\n\n";
    let (result, gw, output) = run_script(script, FakeGateway::default()).await;

    result.unwrap();
    assert!(output.contains("Enter email_address value for record to update: "));
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn update_without_pairs_never_reaches_gateway() {
    let (result, gw, _) = run_script("update\njohn@example.com\n\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn update_binds_key_last() {
    let script = "update\njohn@example.com\ncountry\nDK\n\n";
    let (result, gw, _) = run_script(script, FakeGateway::default()).await;

    result.unwrap();
    let (kind, sql, params) = &gw.calls[0];
    assert_eq!(*kind, StatementKind::Update);
    assert_eq!(
        sql,
        r#"UPDATE "reviews" SET "country" = $1 WHERE "email_address" = $2 RETURNING *"#
    );
    assert_eq!(params, &vec!["DK".to_string(), "john@example.com".to_string()]);
}

#[tokio::test]
async fn delete_all_requires_exact_yes() {
    for answer in ["YES", "Yes", "y", " yes", "no"] {
        let script = format!("delete\n2\n{answer}\n");
        let (result, gw, _) = run_script(&script, FakeGateway::default()).await;
        result.unwrap();
        assert!(gw.calls.is_empty(), "'{answer}' must not delete");
    }

    let (result, gw, output) = run_script("delete\n2\nyes\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(output.contains("Are you sure you want to delete all records from reviews? (yes/no)"));
    assert_eq!(gw.calls.len(), 1);
    assert_eq!(gw.calls[0].1, r#"DELETE FROM "reviews""#);
}

#[tokio::test]
async fn conditional_delete_accepts_yes_in_any_case() {
    let script = "delete\n1\nemail_address\njohn@example.com\nYes\n";
    let (result, gw, _) = run_script(script, FakeGateway::default()).await;

    result.unwrap();
    let (kind, sql, params) = &gw.calls[0];
    assert_eq!(*kind, StatementKind::Delete);
    assert_eq!(
        sql,
        r#"DELETE FROM "reviews" WHERE "email_address" = $1 RETURNING *"#
    );
    assert_eq!(params, &vec!["john@example.com".to_string()]);
}

#[tokio::test]
async fn conditional_delete_can_be_cancelled() {
    let script = "delete\n1\nemail_address\njohn@example.com\nno\n";
    let (result, gw, _) = run_script(script, FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn conditional_delete_needs_field_and_value() {
    let (result, gw, _) = run_script("delete\n1\nemail_address\n  \n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn invalid_delete_choice_does_nothing() {
    let (result, gw, _) = run_script("delete\n3\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn select_lowercases_columns_and_binds_filter() {
    let script = "Select\nReviewer_Name, Country\nemail_address\njohn@example.com\n";
    let (result, gw, output) = run_script(script, FakeGateway::default()).await;

    result.unwrap();
    let (kind, sql, params) = &gw.calls[0];
    assert_eq!(*kind, StatementKind::Select);
    assert_eq!(
        sql,
        r#"SELECT "reviewer_name", "country" FROM "reviews" WHERE "email_address" = $1"#
    );
    assert_eq!(params, &vec!["john@example.com".to_string()]);
    assert!(output.contains("(no rows)"));
}

#[tokio::test]
async fn select_blank_columns_selects_all() {
    let (result, gw, _) = run_script("select\n\n\n", FakeGateway::default()).await;
    result.unwrap();
    assert_eq!(gw.calls[0].1, r#"SELECT * FROM "reviews""#);
}

#[tokio::test]
async fn bad_projection_skips_operation() {
    let (result, gw, _) = run_script("select\na,,b\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn unknown_operation_finishes_quietly() {
    let (result, gw, _) = run_script("truncate\n", FakeGateway::default()).await;
    result.unwrap();
    assert!(gw.calls.is_empty());
}

#[tokio::test]
async fn end_of_input_is_an_io_error() {
    let (result, _, _) = run_script("insert\nemail_address\nbad\n", FakeGateway::default()).await;
    let err = result.unwrap_err();
    assert!(
        matches!(err, TableError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof),
        "got {err:?}"
    );
}

#[tokio::test]
async fn gateway_failures_propagate() {
    let gateway = FakeGateway {
        fail: true,
        ..FakeGateway::default()
    };
    let (result, _, _) = run_script("select\n\n\n", gateway).await;
    assert!(matches!(result.unwrap_err(), TableError::Connection(_)));
}
