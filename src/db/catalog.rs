//! Catalog queries and row parsing for schema introspection.
//!
//! # Architecture
//!
//! SQL is organized in the `queries` submodule with constants for each
//! dialect. Every query aliases its output columns to the same lowercase
//! names, so one set of parsers below turns catalog [`Row`]s into schema
//! models for both dialects. Index and constraint queries return one row per
//! member column; the parsers group consecutive rows by name, keeping order.

use crate::db::dialect::Dialect;
use crate::db::types::{Row, map_type};
use crate::models::{
    Column, Constraint, ConstraintKind, ForeignKey, ForeignKeyAction, Index,
};
use serde_json::Value as JsonValue;

/// Catalog statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQuery {
    BaseTables,
    Views,
    Columns,
    ViewColumns,
    ForeignKeys,
    Indexes,
    Constraints,
}

impl CatalogQuery {
    /// SQL for this query in `dialect`. Parameters are the schema name then,
    /// for per-relation queries, the relation name.
    pub fn sql(&self, dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Postgres => match self {
                Self::BaseTables => queries::postgres::BASE_TABLES,
                Self::Views => queries::postgres::VIEWS,
                Self::Columns => queries::postgres::COLUMNS,
                Self::ViewColumns => queries::postgres::VIEW_COLUMNS,
                Self::ForeignKeys => queries::postgres::FOREIGN_KEYS,
                Self::Indexes => queries::postgres::INDEXES,
                Self::Constraints => queries::postgres::CONSTRAINTS,
            },
            Dialect::SqlServer => match self {
                Self::BaseTables => queries::sqlserver::BASE_TABLES,
                Self::Views => queries::sqlserver::VIEWS,
                Self::Columns => queries::sqlserver::COLUMNS,
                Self::ViewColumns => queries::sqlserver::VIEW_COLUMNS,
                Self::ForeignKeys => queries::sqlserver::FOREIGN_KEYS,
                Self::Indexes => queries::sqlserver::INDEXES,
                Self::Constraints => queries::sqlserver::CONSTRAINTS,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseTables => "base tables",
            Self::Views => "views",
            Self::Columns => "columns",
            Self::ViewColumns => "view columns",
            Self::ForeignKeys => "foreign keys",
            Self::Indexes => "indexes",
            Self::Constraints => "constraints",
        }
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const BASE_TABLES: &str = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1
            AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;

        pub const VIEWS: &str = r#"
            SELECT
                table_name::text AS table_name,
                view_definition::text AS view_definition
            FROM information_schema.views
            WHERE table_schema = $1
            ORDER BY table_name
            "#;

        pub const COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.is_nullable::text AS is_nullable,
            EXISTS (
                SELECT 1
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                    AND tc.table_name = kcu.table_name
                WHERE tc.table_schema = c.table_schema
                AND tc.table_name = c.table_name
                AND tc.constraint_type = 'PRIMARY KEY'
                AND kcu.column_name = c.column_name
            ) AS is_primary_key,
            EXISTS (
                SELECT 1
                FROM information_schema.table_constraints tc
                JOIN information_schema.key_column_usage kcu
                    ON tc.constraint_name = kcu.constraint_name
                    AND tc.table_schema = kcu.table_schema
                    AND tc.table_name = kcu.table_name
                WHERE tc.table_schema = c.table_schema
                AND tc.table_name = c.table_name
                AND tc.constraint_type = 'UNIQUE'
                AND kcu.column_name = c.column_name
            ) AS is_unique
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#;

        pub const VIEW_COLUMNS: &str = r#"
        SELECT
            column_name::text AS column_name,
            data_type::text AS data_type,
            is_nullable::text AS is_nullable
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
        "#;

        pub const FOREIGN_KEYS: &str = r#"
        SELECT
            con.conname::text AS constraint_name,
            src.attname::text AS column_name,
            ref.relname::text AS referenced_table,
            dst.attname::text AS referenced_column,
            CASE con.confupdtype
                WHEN 'a' THEN 'NO ACTION'
                WHEN 'r' THEN 'RESTRICT'
                WHEN 'c' THEN 'CASCADE'
                WHEN 'n' THEN 'SET NULL'
                WHEN 'd' THEN 'SET DEFAULT'
            END AS update_rule,
            CASE con.confdeltype
                WHEN 'a' THEN 'NO ACTION'
                WHEN 'r' THEN 'RESTRICT'
                WHEN 'c' THEN 'CASCADE'
                WHEN 'n' THEN 'SET NULL'
                WHEN 'd' THEN 'SET DEFAULT'
            END AS delete_rule
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_class ref ON ref.oid = con.confrelid
        JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, ref_attnum, ord) ON true
        JOIN pg_attribute src ON src.attrelid = con.conrelid AND src.attnum = k.attnum
        JOIN pg_attribute dst ON dst.attrelid = con.confrelid AND dst.attnum = k.ref_attnum
        WHERE n.nspname = $1
        AND t.relname = $2
        AND con.contype = 'f'
        ORDER BY con.conname, k.ord
        "#;

        pub const INDEXES: &str = r#"
        SELECT
            i.relname::text AS index_name,
            a.attname::text AS column_name,
            ix.indisunique AS is_unique,
            ix.indisprimary AS is_primary
        FROM pg_index ix
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) ON true
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        WHERE n.nspname = $1 AND t.relname = $2
        ORDER BY i.relname, k.ord
        "#;

        // NOT NULL rows (contype 'n') are column metadata, not constraints.
        pub const CONSTRAINTS: &str = r#"
        SELECT
            con.conname::text AS constraint_name,
            CASE con.contype
                WHEN 'p' THEN 'PRIMARY KEY'
                WHEN 'u' THEN 'UNIQUE'
                WHEN 'f' THEN 'FOREIGN KEY'
                WHEN 'c' THEN 'CHECK'
                WHEN 'x' THEN 'EXCLUDE'
            END AS constraint_type,
            a.attname::text AS column_name,
            CASE WHEN con.contype = 'c' THEN pg_get_expr(con.conbin, con.conrelid) END AS check_clause
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        LEFT JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord) ON true
        LEFT JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
        WHERE n.nspname = $1
        AND t.relname = $2
        AND con.contype IN ('p', 'u', 'f', 'c', 'x')
        ORDER BY con.conname, k.ord
        "#;
    }

    pub mod sqlserver {
        pub const BASE_TABLES: &str = r#"
            SELECT TABLE_NAME AS table_name
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = @P1
            AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;

        pub const VIEWS: &str = r#"
            SELECT
                v.TABLE_NAME AS table_name,
                OBJECT_DEFINITION(OBJECT_ID(QUOTENAME(v.TABLE_SCHEMA) + '.' + QUOTENAME(v.TABLE_NAME))) AS view_definition
            FROM INFORMATION_SCHEMA.VIEWS v
            WHERE v.TABLE_SCHEMA = @P1
            ORDER BY v.TABLE_NAME
            "#;

        pub const COLUMNS: &str = r#"
        SELECT
            c.COLUMN_NAME AS column_name,
            c.DATA_TYPE AS data_type,
            c.IS_NULLABLE AS is_nullable,
            CAST(CASE WHEN EXISTS (
                SELECT 1
                FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
                JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                    ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                    AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
                    AND tc.TABLE_NAME = kcu.TABLE_NAME
                WHERE tc.TABLE_SCHEMA = c.TABLE_SCHEMA
                AND tc.TABLE_NAME = c.TABLE_NAME
                AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
                AND kcu.COLUMN_NAME = c.COLUMN_NAME
            ) THEN 1 ELSE 0 END AS BIT) AS is_primary_key,
            CAST(CASE WHEN EXISTS (
                SELECT 1
                FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
                JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
                    ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
                    AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
                    AND tc.TABLE_NAME = kcu.TABLE_NAME
                WHERE tc.TABLE_SCHEMA = c.TABLE_SCHEMA
                AND tc.TABLE_NAME = c.TABLE_NAME
                AND tc.CONSTRAINT_TYPE = 'UNIQUE'
                AND kcu.COLUMN_NAME = c.COLUMN_NAME
            ) THEN 1 ELSE 0 END AS BIT) AS is_unique
        FROM INFORMATION_SCHEMA.COLUMNS c
        WHERE c.TABLE_SCHEMA = @P1 AND c.TABLE_NAME = @P2
        ORDER BY c.ORDINAL_POSITION
        "#;

        pub const VIEW_COLUMNS: &str = r#"
        SELECT
            COLUMN_NAME AS column_name,
            DATA_TYPE AS data_type,
            IS_NULLABLE AS is_nullable
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2
        ORDER BY ORDINAL_POSITION
        "#;

        pub const FOREIGN_KEYS: &str = r#"
        SELECT
            fk.name AS constraint_name,
            pc.name AS column_name,
            rt.name AS referenced_table,
            rc.name AS referenced_column,
            fk.update_referential_action_desc AS update_rule,
            fk.delete_referential_action_desc AS delete_rule
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables pt ON pt.object_id = fk.parent_object_id
        JOIN sys.schemas s ON s.schema_id = pt.schema_id
        JOIN sys.columns pc
            ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id
        JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id
        JOIN sys.columns rc
            ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
        WHERE s.name = @P1 AND pt.name = @P2
        ORDER BY fk.name, fkc.constraint_column_id
        "#;

        pub const INDEXES: &str = r#"
        SELECT
            i.name AS index_name,
            c.name AS column_name,
            i.is_unique AS is_unique,
            i.is_primary_key AS is_primary
        FROM sys.indexes i
        JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
        JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        JOIN sys.tables t ON t.object_id = i.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        WHERE s.name = @P1 AND t.name = @P2
        AND i.name IS NOT NULL
        AND ic.is_included_column = 0
        ORDER BY i.name, ic.key_ordinal
        "#;

        pub const CONSTRAINTS: &str = r#"
        SELECT
            tc.CONSTRAINT_NAME AS constraint_name,
            tc.CONSTRAINT_TYPE AS constraint_type,
            kcu.COLUMN_NAME AS column_name,
            cc.CHECK_CLAUSE AS check_clause
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc
        LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
            ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
            AND tc.TABLE_SCHEMA = kcu.TABLE_SCHEMA
            AND tc.TABLE_NAME = kcu.TABLE_NAME
        LEFT JOIN INFORMATION_SCHEMA.CHECK_CONSTRAINTS cc
            ON tc.CONSTRAINT_NAME = cc.CONSTRAINT_NAME
            AND tc.CONSTRAINT_SCHEMA = cc.CONSTRAINT_SCHEMA
        WHERE tc.TABLE_SCHEMA = @P1 AND tc.TABLE_NAME = @P2
        ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION
        "#;
    }
}

// =============================================================================
// Row Accessors
// =============================================================================

/// Non-empty string value of `key`. Numbers are rendered as text.
pub fn get_string(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Boolean flag of `key`: `true`, non-zero numbers and `YES`/`TRUE`/`1` text.
pub fn get_flag(row: &Row, key: &str) -> bool {
    match row.get(key) {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(JsonValue::String(s)) => {
            matches!(s.trim().to_uppercase().as_str(), "YES" | "TRUE" | "1" | "T" | "Y")
        }
        _ => false,
    }
}

// =============================================================================
// Row Parsers
// =============================================================================

pub fn parse_relation_names(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| get_string(row, "table_name"))
        .collect()
}

/// A view name with its raw definition text.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub name: String,
    pub definition: Option<String>,
}

pub fn parse_views(rows: &[Row]) -> Vec<ViewEntry> {
    rows.iter()
        .filter_map(|row| {
            get_string(row, "table_name").map(|name| ViewEntry {
                name,
                definition: get_string(row, "view_definition"),
            })
        })
        .collect()
}

/// Columns with canonical types. Key flags default to false when a row
/// carries no `is_primary_key` / `is_unique` (view columns).
pub fn parse_columns(dialect: Dialect, rows: &[Row]) -> Vec<Column> {
    rows.iter()
        .filter_map(|row| {
            let name = get_string(row, "column_name")?;
            let raw_type = get_string(row, "data_type").unwrap_or_default();
            Some(
                Column::new(name, map_type(dialect, &raw_type))
                    .with_nullable(get_flag(row, "is_nullable"))
                    .with_primary_key(get_flag(row, "is_primary_key"))
                    .with_unique(get_flag(row, "is_unique")),
            )
        })
        .collect()
}

pub fn parse_foreign_keys(rows: &[Row]) -> Vec<ForeignKey> {
    rows.iter()
        .filter_map(|row| {
            let column = get_string(row, "column_name")?;
            let name = get_string(row, "constraint_name").unwrap_or_default();
            let ref_table = get_string(row, "referenced_table").unwrap_or_default();
            let ref_column = get_string(row, "referenced_column").unwrap_or_default();
            let update_rule = get_string(row, "update_rule").unwrap_or_default();
            let delete_rule = get_string(row, "delete_rule").unwrap_or_default();

            Some(
                ForeignKey::new(name, column, ref_table, ref_column)
                    .with_on_update(ForeignKeyAction::parse(&update_rule))
                    .with_on_delete(ForeignKeyAction::parse(&delete_rule)),
            )
        })
        .collect()
}

/// One index per distinct `index_name`, member columns in row order.
pub fn parse_indexes(rows: &[Row]) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();
    for row in rows {
        let Some(name) = get_string(row, "index_name") else {
            continue;
        };
        let position = match indexes.iter().position(|i| i.name == name) {
            Some(pos) => pos,
            None => {
                indexes.push(
                    Index::new(&name)
                        .with_unique(get_flag(row, "is_unique"))
                        .with_primary(get_flag(row, "is_primary")),
                );
                indexes.len() - 1
            }
        };
        if let Some(column) = get_string(row, "column_name") {
            indexes[position].columns.push(column);
        }
    }
    indexes
}

/// One constraint per distinct `constraint_name`. The check clause is kept
/// for CHECK constraints only.
pub fn parse_constraints(rows: &[Row]) -> Vec<Constraint> {
    let mut constraints: Vec<Constraint> = Vec::new();
    for row in rows {
        let Some(name) = get_string(row, "constraint_name") else {
            continue;
        };
        let position = match constraints.iter().position(|c| c.name == name) {
            Some(pos) => pos,
            None => {
                let kind =
                    ConstraintKind::parse(&get_string(row, "constraint_type").unwrap_or_default());
                let mut constraint = Constraint::new(&name, kind);
                if kind == ConstraintKind::Check {
                    if let Some(clause) = get_string(row, "check_clause") {
                        constraint = constraint.with_definition(clause);
                    }
                }
                constraints.push(constraint);
                constraints.len() - 1
            }
        };
        if let Some(column) = get_string(row, "column_name") {
            if !constraints[position].columns.contains(&column) {
                constraints[position].columns.push(column);
            }
        }
    }
    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalType;
    use serde_json::json;

    fn rows(values: Vec<JsonValue>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_queries_use_dialect_placeholders() {
        for query in [
            CatalogQuery::BaseTables,
            CatalogQuery::Views,
            CatalogQuery::Columns,
            CatalogQuery::ViewColumns,
            CatalogQuery::ForeignKeys,
            CatalogQuery::Indexes,
            CatalogQuery::Constraints,
        ] {
            assert!(query.sql(Dialect::Postgres).contains("$1"), "{}", query.label());
            assert!(!query.sql(Dialect::Postgres).contains("@P1"));
            assert!(query.sql(Dialect::SqlServer).contains("@P1"), "{}", query.label());
        }
    }

    #[test]
    fn test_postgres_key_queries_scope_by_relation_oid() {
        for query in [CatalogQuery::ForeignKeys, CatalogQuery::Constraints] {
            let sql = query.sql(Dialect::Postgres);
            assert!(sql.contains("FROM pg_constraint con"), "{}", query.label());
            assert!(sql.contains("con.conrelid"), "{}", query.label());
            assert!(!sql.contains("NOT LIKE"), "{}", query.label());
        }
        assert!(CatalogQuery::ForeignKeys.sql(Dialect::Postgres).contains("unnest(con.conkey, con.confkey)"));
    }

    #[test]
    fn test_get_flag_variants() {
        let row = rows(vec![json!({
            "a": true, "b": 1, "c": "YES", "d": "NO", "e": 0, "f": null
        })])
        .remove(0);
        assert!(get_flag(&row, "a"));
        assert!(get_flag(&row, "b"));
        assert!(get_flag(&row, "c"));
        assert!(!get_flag(&row, "d"));
        assert!(!get_flag(&row, "e"));
        assert!(!get_flag(&row, "f"));
        assert!(!get_flag(&row, "missing"));
    }

    #[test]
    fn test_parse_columns() {
        let parsed = parse_columns(
            Dialect::Postgres,
            &rows(vec![
                json!({ "column_name": "id", "data_type": "integer", "is_nullable": "NO", "is_primary_key": true, "is_unique": false }),
                json!({ "column_name": "name", "data_type": "character varying", "is_nullable": "YES" }),
            ]),
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].column_type, CanonicalType::Number);
        assert!(parsed[0].is_primary_key);
        assert!(!parsed[0].is_nullable);
        assert_eq!(parsed[1].column_type, CanonicalType::String);
        assert!(parsed[1].is_nullable);
        assert_eq!(parsed[1].alias, "name");
    }

    #[test]
    fn test_parse_foreign_keys_normalizes_actions() {
        let parsed = parse_foreign_keys(&rows(vec![json!({
            "constraint_name": "fk_orders_user",
            "column_name": "user_id",
            "referenced_table": "users",
            "referenced_column": "id",
            "update_rule": "NO_ACTION",
            "delete_rule": "CASCADE"
        })]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].referenced_table, "users");
        assert_eq!(parsed[0].on_update, ForeignKeyAction::NoAction);
        assert_eq!(parsed[0].on_delete, ForeignKeyAction::Cascade);
    }

    #[test]
    fn test_parse_indexes_groups_columns_in_order() {
        let parsed = parse_indexes(&rows(vec![
            json!({ "index_name": "idx_name_email", "column_name": "name", "is_unique": 0, "is_primary": 0 }),
            json!({ "index_name": "idx_name_email", "column_name": "email", "is_unique": 0, "is_primary": 0 }),
            json!({ "index_name": "users_pkey", "column_name": "id", "is_unique": true, "is_primary": true }),
        ]));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].columns, vec!["name", "email"]);
        assert!(!parsed[0].is_unique);
        assert!(parsed[1].is_primary);
        assert!(parsed[1].is_unique);
    }

    #[test]
    fn test_parse_constraints_keeps_check_clause() {
        let parsed = parse_constraints(&rows(vec![
            json!({ "constraint_name": "users_pkey", "constraint_type": "PRIMARY KEY", "column_name": "id", "check_clause": null }),
            json!({ "constraint_name": "price_positive", "constraint_type": "CHECK", "column_name": null, "check_clause": "(price > 0)" }),
            json!({ "constraint_name": "uq_pair", "constraint_type": "UNIQUE", "column_name": "a", "check_clause": null }),
            json!({ "constraint_name": "uq_pair", "constraint_type": "UNIQUE", "column_name": "b", "check_clause": null }),
        ]));
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].kind, ConstraintKind::PrimaryKey);
        assert!(parsed[0].definition.is_none());
        assert_eq!(parsed[1].kind, ConstraintKind::Check);
        assert_eq!(parsed[1].definition.as_deref(), Some("(price > 0)"));
        assert!(parsed[1].columns.is_empty());
        assert_eq!(parsed[2].columns, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_views() {
        let parsed = parse_views(&rows(vec![
            json!({ "table_name": "active_users", "view_definition": "SELECT 1" }),
            json!({ "table_name": "bare" }),
        ]));
        assert_eq!(parsed[0].definition.as_deref(), Some("SELECT 1"));
        assert!(parsed[1].definition.is_none());
    }
}
