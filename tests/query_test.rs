//! Integration tests for the safe query executor.

mod common;

use common::{ScriptedConnector, fail, local_details, reply, single_table_catalog};
use report_builder::db::SqlParam;
use report_builder::error::AppError;
use report_builder::models::{
    AdHocSource, CanonicalType, Column, ConnectionDetails, DataSource, SchemaSource, Table,
    View,
};
use report_builder::service::{SafeQueryExecutor, SchemaDiscovery};
use report_builder::store::Store;
use serde_json::json;

fn users_table() -> Table {
    Table::new("users").with_columns(vec![
        Column::new("id", CanonicalType::Number),
        Column::new("name", CanonicalType::String),
    ])
}

fn ad_hoc(source_type: &str, details: Option<ConnectionDetails>) -> SchemaSource {
    SchemaSource::AdHoc(AdHocSource {
        source_type: source_type.to_string(),
        connection_details: details,
        tables: vec![users_table()],
        views: Vec::new(),
    })
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn executor(connector: &ScriptedConnector) -> (SafeQueryExecutor, Store) {
    let store = Store::open("sqlite::memory:").await.unwrap();
    (SafeQueryExecutor::new(connector.arc(), store.clone()), store)
}

async fn save_source(store: &Store, payload: serde_json::Value) -> DataSource {
    let repo = store.data_sources();
    let data_source = repo.create(payload).unwrap();
    repo.save(&data_source).await.unwrap();
    data_source
}

#[tokio::test]
async fn test_query_rejects_unknown_columns_without_connecting() {
    let connector = ScriptedConnector::new(Vec::new());
    let (executor, store) = executor(&connector).await;
    let data_source = save_source(
        &store,
        json!({
            "name": "pg",
            "type": "postgres",
            "connectionDetails": { "host": "localhost" },
            "tables": [{ "name": "users", "columns": [{ "name": "id" }] }]
        }),
    )
    .await;

    let err = executor
        .query(
            SchemaSource::Stored(data_source.id.clone()),
            "users",
            &columns(&["id", "secret"]),
            None,
        )
        .await
        .unwrap_err();

    match &err {
        AppError::Validation { message, invalid } => {
            assert_eq!(message, "invalid columns");
            assert_eq!(invalid, &vec!["secret".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.status().as_u16(), 400);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_query_validates_columns_before_host() {
    let connector = ScriptedConnector::new(Vec::new());
    let (executor, _store) = executor(&connector).await;

    let err = executor
        .query(
            ad_hoc("postgres", Some(ConnectionDetails::default())),
            "users",
            &columns(&["id", "email"]),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "invalid columns");

    let err = executor
        .query(
            ad_hoc("postgres", Some(ConnectionDetails::default())),
            "users",
            &columns(&["id"]),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_query_default_limit_is_bound() {
    let connector = ScriptedConnector::new(vec![reply(json!([{ "id": 1, "name": "Alice" }]))]);
    let (executor, _store) = executor(&connector).await;

    let rows = executor
        .query(
            ad_hoc("postgres", Some(local_details())),
            "users",
            &columns(&["id", "name"]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let statements = connector.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].0,
        r#"SELECT "id", "name" FROM "public"."users" LIMIT $1"#
    );
    assert_eq!(statements[0].1, vec![SqlParam::Int(50)]);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_query_honors_limit() {
    let five = json!([
        { "id": 1, "name": "Alice" },
        { "id": 2, "name": "Bob" },
        { "id": 3, "name": "Carol" },
        { "id": 4, "name": "Dan" },
        { "id": 5, "name": "Eve" }
    ]);
    let connector = ScriptedConnector::new(vec![reply(five)]);
    let (executor, _store) = executor(&connector).await;

    let rows = executor
        .query(
            ad_hoc("postgres", Some(local_details())),
            "users",
            &columns(&["id", "name"]),
            Some(&json!(2)),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Alice");
    assert_eq!(connector.statements()[0].1, vec![SqlParam::Int(2)]);
}

#[tokio::test]
async fn test_query_ad_hoc_source() {
    let connector = ScriptedConnector::new(vec![reply(json!([{ "id": 1, "name": "AdHoc" }]))]);
    let (executor, _store) = executor(&connector).await;

    let rows = executor
        .query(
            ad_hoc("postgres", Some(ConnectionDetails::new("localhost"))),
            "users",
            &columns(&["id", "name"]),
            Some(&json!(10)),
        )
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&rows).unwrap(), json!([{ "id": 1, "name": "AdHoc" }]));
}

#[tokio::test]
async fn test_query_sqlserver_inlines_top() {
    let connector = ScriptedConnector::new(vec![reply(json!([
        { "id": 1, "name": "Alice" },
        { "id": 2, "name": "Bob" }
    ]))]);
    let (executor, store) = executor(&connector).await;
    let data_source = save_source(
        &store,
        json!({
            "name": "mssql",
            "type": "sql",
            "connectionDetails": { "host": "localhost" },
            "tables": [{ "name": "users", "columns": [{ "name": "id" }, { "name": "name" }] }]
        }),
    )
    .await;

    let rows = executor
        .query(
            SchemaSource::Stored(data_source.id.clone()),
            "users",
            &columns(&["id", "name"]),
            Some(&json!("2")),
        )
        .await
        .unwrap();

    assert_eq!(rows[1]["name"], "Bob");
    let statements = connector.statements();
    assert_eq!(statements[0].0, "SELECT TOP (2) [id], [name] FROM [dbo].[users]");
    assert!(statements[0].1.is_empty());
}

#[tokio::test]
async fn test_query_rejects_unsupported_type() {
    let connector = ScriptedConnector::new(Vec::new());
    let (executor, store) = executor(&connector).await;
    let data_source = save_source(
        &store,
        json!({
            "name": "custom",
            "type": "custom",
            "connectionDetails": {},
            "tables": [{ "name": "t", "columns": [{ "name": "c" }] }]
        }),
    )
    .await;

    let err = executor
        .query(
            SchemaSource::Stored(data_source.id.clone()),
            "t",
            &columns(&["c"]),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.status().as_u16(), 400);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_query_unknown_data_source() {
    let connector = ScriptedConnector::new(Vec::new());
    let (executor, _store) = executor(&connector).await;

    let err = executor
        .query(
            SchemaSource::Stored("missing".to_string()),
            "users",
            &columns(&["id"]),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_query_unknown_table_and_empty_columns() {
    let connector = ScriptedConnector::new(Vec::new());
    let (executor, _store) = executor(&connector).await;

    let err = executor
        .query(
            ad_hoc("postgres", Some(local_details())),
            "accounts",
            &columns(&["id"]),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = executor
        .query(ad_hoc("postgres", Some(local_details())), "users", &[], None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_query_failure_closes_connection() {
    let connector = ScriptedConnector::new(vec![fail("relation \"users\" does not exist")]);
    let (executor, _store) = executor(&connector).await;

    let err = executor
        .query(
            ad_hoc("postgres", Some(local_details())),
            "users",
            &columns(&["id"]),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Query { .. }));
    assert_eq!(err.public_message(), "could not connect or execute query");
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_query_connect_failure() {
    let connector = ScriptedConnector::refusing();
    let (executor, _store) = executor(&connector).await;

    let err = executor
        .query(
            ad_hoc("postgres", Some(ConnectionDetails::new("unreachable.invalid"))),
            "users",
            &columns(&["id"]),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.status().as_u16(), 502);
    assert_eq!(connector.closes(), 0);
}

#[tokio::test]
async fn test_query_view_by_id() {
    let view = View::new("active_users").with_columns(vec![Column::new("email", CanonicalType::String)]);
    let view_id = view.id.clone();
    let connector = ScriptedConnector::new(vec![reply(json!([{ "email": "a@example.com" }]))]);
    let (executor, _store) = executor(&connector).await;

    let source = SchemaSource::AdHoc(AdHocSource {
        source_type: "pg".to_string(),
        connection_details: Some(local_details()),
        tables: vec![users_table()],
        views: vec![view],
    });

    let rows = executor
        .query(source, &view_id, &columns(&["email"]), None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert!(connector.statements()[0].0.contains(r#"FROM "public"."active_users""#));
}

#[tokio::test]
async fn test_persisted_discovery_validates_like_ad_hoc() {
    let connector = ScriptedConnector::new(single_table_catalog());
    let discovery = SchemaDiscovery::new(connector.arc());
    let schema = discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap();

    let (executor, store) = executor(&connector).await;
    let data_source = save_source(
        &store,
        json!({
            "name": "discovered",
            "type": "postgres",
            "connectionDetails": { "host": "localhost" },
            "tables": schema.tables.clone(),
            "views": schema.views.clone()
        }),
    )
    .await;

    let requested = columns(&["id", "secret", "name", "password"]);
    let stored = executor
        .query(
            SchemaSource::Stored(data_source.id.clone()),
            "T",
            &requested,
            None,
        )
        .await
        .unwrap_err();
    let inline = executor
        .query(
            SchemaSource::AdHoc(AdHocSource {
                source_type: "postgres".to_string(),
                connection_details: Some(local_details()),
                tables: schema.tables.clone(),
                views: schema.views.clone(),
            }),
            "T",
            &requested,
            None,
        )
        .await
        .unwrap_err();

    match (stored, inline) {
        (
            AppError::Validation { invalid: a, .. },
            AppError::Validation { invalid: b, .. },
        ) => {
            assert_eq!(a, vec!["secret", "password"]);
            assert_eq!(a, b);
        }
        other => panic!("expected two validation errors, got {other:?}"),
    }
}
