//! Type mapping and row decoding.
//!
//! Two concerns live here:
//! 1. [`map_type`] folds a dialect's raw column type into a [`CanonicalType`]
//!    for schema documents.
//! 2. Driver rows are decoded into the canonical [`Row`] (an ordered JSON
//!    object) at the adapter boundary. `TypeCategory` classifies the wire type
//!    and a per-category decoder extracts the value.

use crate::db::dialect::Dialect;
use crate::models::CanonicalType;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::{Column, Decode, Row as _, Type, TypeInfo};

/// One result row, column name to value, in select order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Rows returned by one statement.
pub type RowSet = Vec<Row>;

// =============================================================================
// Canonical Type Mapping
// =============================================================================

/// Map a raw catalog type name to a canonical type. Total and case-insensitive.
pub fn map_type(dialect: Dialect, raw_type: &str) -> CanonicalType {
    let lower = raw_type.trim().to_lowercase();

    if lower.contains("char") || lower.contains("text") || lower == dialect.uuid_type() {
        return CanonicalType::String;
    }

    match dialect {
        Dialect::Postgres => {
            if lower == "boolean" {
                return CanonicalType::Boolean;
            }
            if lower == "money" {
                return CanonicalType::Currency;
            }
        }
        Dialect::SqlServer => {
            if lower == "bit" || lower == "boolean" {
                return CanonicalType::Boolean;
            }
            if lower == "money" || lower == "smallmoney" {
                return CanonicalType::Number;
            }
        }
    }

    if lower.contains("int")
        || matches!(
            lower.as_str(),
            "numeric" | "decimal" | "real" | "double precision" | "float"
        )
    {
        return CanonicalType::Number;
    }

    if lower.contains("time") || lower.contains("date") {
        return CanonicalType::Date;
    }

    CanonicalType::String
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for a column's wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Money,
    Boolean,
    Binary,
    Json,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Unknown,
}

/// Classify a Postgres wire type name.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    match lower.as_str() {
        "numeric" | "decimal" => return TypeCategory::Decimal,
        "money" => return TypeCategory::Money,
        "bool" | "boolean" => return TypeCategory::Boolean,
        "json" | "jsonb" => return TypeCategory::Json,
        "uuid" => return TypeCategory::Uuid,
        "bytea" => return TypeCategory::Binary,
        "timestamptz" => return TypeCategory::TimestampTz,
        "timestamp" => return TypeCategory::Timestamp,
        "date" => return TypeCategory::Date,
        "time" => return TypeCategory::Time,
        _ => {}
    }

    if lower.starts_with("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower.starts_with("float") || lower == "real" || lower == "double precision" {
        return TypeCategory::Float;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Raw NUMERIC value as its exact textual representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Binary cells always travel as base64 text.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    JsonValue::String(STANDARD.encode(bytes))
}

/// Exact text for an unscaled integer and its decimal scale, e.g. (-5, 2) is `-0.05`.
pub fn scaled_decimal_text(value: i128, scale: u8) -> String {
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    let scale = usize::from(scale);
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

/// JSON number for a float, or its text if not representable (NaN, inf).
pub fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

// =============================================================================
// Row to JSON
// =============================================================================

/// Convert a driver row into the canonical [`Row`].
pub trait RowToJson {
    fn to_json_map(&self) -> Row;
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                let value = postgres::decode_column(self, idx, category);
                (col.name().to_string(), value)
            })
            .collect()
    }
}

mod postgres {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use sqlx::Row as _;
    use sqlx::postgres::types::PgMoney;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Money => decode_money(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Uuid => decode_uuid(row, idx),
            TypeCategory::Timestamp => decode_display::<NaiveDateTime>(row, idx),
            TypeCategory::TimestampTz => row
                .try_get::<Option<DateTime<Utc>>, _>(idx)
                .ok()
                .flatten()
                .map(|v| JsonValue::String(v.to_rfc3339()))
                .unwrap_or(JsonValue::Null),
            TypeCategory::Date => decode_display::<NaiveDate>(row, idx),
            TypeCategory::Time => decode_display::<NaiveTime>(row, idx),
            TypeCategory::Unknown => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> JsonValue {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => JsonValue::String(v.0),
            Ok(None) => JsonValue::Null,
            Err(e) => {
                tracing::error!("Failed to decode NUMERIC: {:?}", e);
                JsonValue::Null
            }
        }
    }

    /// Assumes the server's two-fraction-digit money locale.
    fn decode_money(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<PgMoney>, _>(idx)
            .ok()
            .flatten()
            .map(|m| float_value(m.0 as f64 / 100.0))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
            return JsonValue::Number(v.into());
        }
        JsonValue::Null
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return float_value(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
            return float_value(v as f64);
        }
        JsonValue::Null
    }

    fn decode_binary_col(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| decode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(JsonValue::Null)
    }

    fn decode_uuid(row: &PgRow, idx: usize) -> JsonValue {
        row.try_get::<Option<uuid::Uuid>, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_display<T>(row: &PgRow, idx: usize) -> JsonValue
    where
        T: for<'r> Decode<'r, sqlx::Postgres> + Type<sqlx::Postgres> + std::fmt::Display,
    {
        row.try_get::<Option<T>, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::String(v.to_string()))
            .unwrap_or(JsonValue::Null)
    }

    /// Text types and anything unclassified (enums, intervals) as a string.
    fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(JsonValue::String).unwrap_or(JsonValue::Null);
        }
        row.try_get_unchecked::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}
