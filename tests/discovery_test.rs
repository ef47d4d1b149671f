//! Integration tests for schema discovery against a scripted driver.

mod common;

use common::{ScriptedConnector, empty, fail, local_details, reply, single_table_catalog};
use report_builder::db::SqlParam;
use report_builder::error::AppError;
use report_builder::models::{CanonicalType, ConnectionDetails, ConstraintKind};
use report_builder::service::SchemaDiscovery;
use serde_json::{Value as JsonValue, json};

fn strip_ids(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            map.remove("id");
            map.values_mut().for_each(strip_ids);
        }
        JsonValue::Array(items) => items.iter_mut().for_each(strip_ids),
        _ => {}
    }
}

#[tokio::test]
async fn test_discover_single_table() {
    let connector = ScriptedConnector::new(single_table_catalog());
    let discovery = SchemaDiscovery::new(connector.arc());

    let schema = discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap();

    assert_eq!(schema.tables.len(), 1);
    assert!(schema.views.is_empty());

    let table = &schema.tables[0];
    assert_eq!(table.name, "T");
    assert_eq!(table.alias, "T");
    assert!(table.exposed);
    assert_eq!(table.columns.len(), 2);

    let id = &table.columns[0];
    assert_eq!(id.name, "id");
    assert!(id.is_primary_key);
    assert!(!id.is_nullable);
    assert_eq!(id.column_type, CanonicalType::Number);

    let name = &table.columns[1];
    assert_eq!(name.column_type, CanonicalType::String);
    assert!(!name.is_primary_key);
    assert!(name.is_nullable);

    assert_eq!(table.indexes.len(), 1);
    assert!(table.indexes[0].is_primary);
    assert_eq!(table.constraints[0].kind, ConstraintKind::PrimaryKey);
    assert_eq!(table.constraints[0].columns, vec!["id"]);

    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_discover_binds_schema_and_table() {
    let connector = ScriptedConnector::new(single_table_catalog());
    let discovery = SchemaDiscovery::new(connector.arc());
    discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap();

    let statements = connector.statements();
    // tables, 4 per-table fetches, views
    assert_eq!(statements.len(), 6);
    assert_eq!(statements[0].1, vec![SqlParam::from("public")]);
    assert_eq!(
        statements[1].1,
        vec![SqlParam::from("public"), SqlParam::from("T")]
    );
    assert!(statements.iter().all(|(sql, _)| sql.contains("$1")));
}

#[tokio::test]
async fn test_discover_tables_and_views() {
    let connector = ScriptedConnector::new(vec![
        reply(json!([{ "table_name": "users" }, { "table_name": "orders" }])),
        reply(json!([
            { "column_name": "id", "data_type": "integer" },
            { "column_name": "name", "data_type": "character varying" }
        ])),
        empty(),
        empty(),
        empty(),
        reply(json!([
            { "column_name": "id", "data_type": "integer" },
            { "column_name": "total", "data_type": "money" },
            { "column_name": "user_id", "data_type": "integer" }
        ])),
        reply(json!([{
            "constraint_name": "orders_user_fk",
            "column_name": "user_id",
            "referenced_table": "users",
            "referenced_column": "id",
            "update_rule": "NO ACTION",
            "delete_rule": "CASCADE"
        }])),
        empty(),
        empty(),
        reply(json!([{ "table_name": "big_orders", "view_definition": " SELECT * FROM orders WHERE total > 100" }])),
        reply(json!([
            { "column_name": "id", "data_type": "integer", "is_nullable": "YES" },
            { "column_name": "placed_at", "data_type": "timestamp with time zone", "is_nullable": "YES" }
        ])),
    ]);
    let discovery = SchemaDiscovery::new(connector.arc());

    let schema = discovery
        .discover("postgresql", Some(&local_details()))
        .await
        .unwrap();

    assert_eq!(schema.tables.len(), 2);
    assert_eq!(schema.tables[0].columns.len(), 2);

    let orders = &schema.tables[1];
    assert_eq!(orders.columns[1].column_type, CanonicalType::Currency);
    assert_eq!(orders.foreign_keys.len(), 1);
    assert_eq!(orders.foreign_keys[0].referenced_table, "users");
    assert_eq!(orders.foreign_keys[0].on_delete.to_string(), "CASCADE");

    assert_eq!(schema.views.len(), 1);
    let view = &schema.views[0];
    assert_eq!(view.name, "big_orders");
    assert!(view.definition.as_deref().unwrap().contains("total > 100"));
    assert_eq!(view.columns[1].column_type, CanonicalType::Date);

    assert_eq!(connector.remaining(), 0);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_discover_is_idempotent_up_to_ids() {
    let connector = ScriptedConnector::new(single_table_catalog());
    connector.push(single_table_catalog());
    let discovery = SchemaDiscovery::new(connector.arc());

    let first = discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap();
    let second = discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap();

    assert_ne!(first.tables[0].id, second.tables[0].id);

    let mut first = serde_json::to_value(&first).unwrap();
    let mut second = serde_json::to_value(&second).unwrap();
    strip_ids(&mut first);
    strip_ids(&mut second);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_discover_rejects_unsupported_type_before_connecting() {
    let connector = ScriptedConnector::new(single_table_catalog());
    let discovery = SchemaDiscovery::new(connector.arc());

    let err = discovery
        .discover("oracle", Some(&local_details()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnsupportedType { .. }));
    assert_eq!(err.status().as_u16(), 400);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_discover_requires_host() {
    let connector = ScriptedConnector::new(Vec::new());
    let discovery = SchemaDiscovery::new(connector.arc());

    let err = discovery
        .discover("postgres", Some(&ConnectionDetails::default()))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = discovery.discover("postgres", None).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn test_discover_connect_failure_is_bad_gateway() {
    let connector = ScriptedConnector::refusing();
    let discovery = SchemaDiscovery::new(connector.arc());

    let err = discovery
        .discover("postgres", Some(&ConnectionDetails::new("bad")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Connection { .. }));
    assert_eq!(err.status().as_u16(), 502);
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 0);
}

#[tokio::test]
async fn test_discover_postgres_aborts_on_metadata_failure() {
    let connector = ScriptedConnector::new(vec![
        reply(json!([{ "table_name": "users" }])),
        reply(json!([{ "column_name": "id", "data_type": "integer" }])),
        fail("permission denied for relation pg_index"),
    ]);
    let discovery = SchemaDiscovery::new(connector.arc());

    let err = discovery
        .discover("postgres", Some(&local_details()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Query { .. }));
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_discover_sqlserver_degrades_metadata_failure() {
    let connector = ScriptedConnector::new(vec![
        reply(json!([{ "table_name": "users" }])),
        reply(json!([
            { "column_name": "id", "data_type": "int", "is_nullable": "NO", "is_primary_key": 1, "is_unique": 0 },
            { "column_name": "active", "data_type": "bit", "is_nullable": "NO", "is_primary_key": 0, "is_unique": 0 },
            { "column_name": "balance", "data_type": "money", "is_nullable": "YES", "is_primary_key": 0, "is_unique": 0 }
        ])),
        fail("VIEW DEFINITION permission denied"),
        fail("VIEW DEFINITION permission denied"),
        fail("VIEW DEFINITION permission denied"),
        empty(),
    ]);
    let discovery = SchemaDiscovery::new(connector.arc());

    let schema = discovery
        .discover("mssql", Some(&ConnectionDetails::new("sql.local")))
        .await
        .unwrap();

    let users = &schema.tables[0];
    assert_eq!(users.columns.len(), 3);
    assert!(users.columns[0].is_primary_key);
    assert_eq!(users.columns[1].column_type, CanonicalType::Boolean);
    assert_eq!(users.columns[2].column_type, CanonicalType::Number);
    assert!(users.foreign_keys.is_empty());
    assert!(users.indexes.is_empty());
    assert!(users.constraints.is_empty());

    let statements = connector.statements();
    assert_eq!(statements[0].1, vec![SqlParam::from("dbo")]);
    assert!(statements.iter().all(|(sql, _)| sql.contains("@P1")));
    assert_eq!(connector.closes(), 1);
}
