//! Schema document models.
//!
//! These are the records produced by schema discovery and persisted inside a
//! data source. They serialize with camelCase keys. Every field except `name`
//! has a default so that partially specified documents from clients (ad-hoc
//! sources, hand-edited snapshots) still deserialize.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Fresh identifier for a discovered schema element.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Normalized column type shared by every dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    #[default]
    String,
    Boolean,
    Number,
    Date,
    Currency,
}

impl CanonicalType {
    /// Parse a canonical type name, case-insensitive. Anything else is `string`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "boolean" => Self::Boolean,
            "number" => Self::Number,
            "date" => Self::Date,
            "currency" => Self::Currency,
            _ => Self::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Date => "date",
            Self::Currency => "currency",
        }
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any JSON scalar as text; null or missing is empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// A type name outside the canonical set reads as `string`.
fn lenient_type<'de, D>(deserializer: D) -> Result<CanonicalType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => CanonicalType::parse(&s),
        _ => CanonicalType::default(),
    })
}

fn alias_or_name(alias: String, name: &str) -> String {
    if alias.trim().is_empty() {
        name.to_string()
    } else {
        alias
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ColumnFields")]
pub struct Column {
    pub id: String,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub sample_value: String,
    #[serde(rename = "type")]
    pub column_type: CanonicalType,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
}

/// Column as sent by clients or the generative model.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnFields {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    alias: String,
    #[serde(default, deserialize_with = "lenient_text")]
    description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    sample_value: String,
    #[serde(default, rename = "type", deserialize_with = "lenient_type")]
    column_type: CanonicalType,
    #[serde(default)]
    is_nullable: bool,
    #[serde(default)]
    is_primary_key: bool,
    #[serde(default)]
    is_unique: bool,
}

impl From<ColumnFields> for Column {
    fn from(f: ColumnFields) -> Self {
        Self {
            alias: alias_or_name(f.alias, &f.name),
            id: f.id,
            name: f.name,
            description: f.description,
            sample_value: f.sample_value,
            column_type: f.column_type,
            is_nullable: f.is_nullable,
            is_primary_key: f.is_primary_key,
            is_unique: f.is_unique,
        }
    }
}

impl Column {
    /// Create a column with a fresh id and `alias` equal to `name`.
    pub fn new(name: impl Into<String>, column_type: CanonicalType) -> Self {
        let name = name.into();
        Self {
            id: new_id(),
            alias: name.clone(),
            name,
            description: String::new(),
            sample_value: String::new(),
            column_type,
            is_nullable: false,
            is_primary_key: false,
            is_unique: false,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.is_primary_key = is_pk;
        self
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    /// Parse a catalog rule. SQL Server reports `SET_NULL`, Postgres `SET NULL`.
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_uppercase().replace('_', " ");
        match upper.as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            "RESTRICT" => Self::Restrict,
            _ => Self::NoAction,
        }
    }
}

impl From<String> for ForeignKeyAction {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ForeignKeyAction> for String {
    fn from(action: ForeignKeyAction) -> Self {
        action.to_string()
    }
}

impl std::fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAction => write!(f, "NO ACTION"),
            Self::Restrict => write!(f, "RESTRICT"),
            Self::Cascade => write!(f, "CASCADE"),
            Self::SetNull => write!(f, "SET NULL"),
            Self::SetDefault => write!(f, "SET DEFAULT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(default)]
    pub on_update: ForeignKeyAction,
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        column_name: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            column_name: column_name.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            on_update: ForeignKeyAction::NoAction,
            on_delete: ForeignKeyAction::NoAction,
        }
    }

    pub fn with_on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn with_on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Member columns in key order
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
}

impl Index {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            columns: Vec::new(),
            is_unique: false,
            is_primary: false,
        }
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }

    /// A primary index is always unique.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        if is_primary {
            self.is_unique = true;
        }
        self
    }
}

/// Kind of a table constraint as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    ForeignKey,
    Other,
}

impl ConstraintKind {
    /// Parse from a catalog `constraint_type` value.
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_uppercase().replace('_', " ");
        match upper.as_str() {
            "PRIMARY KEY" => Self::PrimaryKey,
            "UNIQUE" => Self::Unique,
            "CHECK" => Self::Check,
            "FOREIGN KEY" => Self::ForeignKey,
            _ => Self::Other,
        }
    }
}

impl From<String> for ConstraintKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ConstraintKind> for String {
    fn from(kind: ConstraintKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryKey => write!(f, "PRIMARY KEY"),
            Self::Unique => write!(f, "UNIQUE"),
            Self::Check => write!(f, "CHECK"),
            Self::ForeignKey => write!(f, "FOREIGN KEY"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Check clause text, CHECK constraints only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            columns: Vec::new(),
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TableFields")]
pub struct Table {
    pub id: String,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub exposed: bool,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableFields {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    alias: String,
    #[serde(default, deserialize_with = "lenient_text")]
    description: String,
    #[serde(default = "default_true")]
    exposed: bool,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    constraints: Vec<Constraint>,
}

impl From<TableFields> for Table {
    fn from(f: TableFields) -> Self {
        Self {
            alias: alias_or_name(f.alias, &f.name),
            id: f.id,
            name: f.name,
            description: f.description,
            exposed: f.exposed,
            columns: f.columns,
            foreign_keys: f.foreign_keys,
            indexes: f.indexes,
            constraints: f.constraints,
        }
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: new_id(),
            alias: name.clone(),
            name,
            description: String::new(),
            exposed: true,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_foreign_keys(mut self, foreign_keys: Vec<ForeignKey>) -> Self {
        self.foreign_keys = foreign_keys;
        self
    }

    pub fn with_indexes(mut self, indexes: Vec<Index>) -> Self {
        self.indexes = indexes;
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Whether `column` is one of this table's known column names.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ViewFields")]
pub struct View {
    pub id: String,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub exposed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub columns: Vec<Column>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewFields {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    alias: String,
    #[serde(default, deserialize_with = "lenient_text")]
    description: String,
    #[serde(default = "default_true")]
    exposed: bool,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    columns: Vec<Column>,
}

impl From<ViewFields> for View {
    fn from(f: ViewFields) -> Self {
        Self {
            alias: alias_or_name(f.alias, &f.name),
            id: f.id,
            name: f.name,
            description: f.description,
            exposed: f.exposed,
            definition: f.definition,
            columns: f.columns,
        }
    }
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: new_id(),
            alias: name.clone(),
            name,
            description: String::new(),
            exposed: true,
            definition: None,
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_definition(mut self, definition: Option<String>) -> Self {
        self.definition = definition.filter(|d| !d.is_empty());
        self
    }
}

/// Result of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub views: Vec<View>,
}

/// A queryable relation resolved from a schema document.
#[derive(Debug, Clone, Copy)]
pub enum Relation<'a> {
    Table(&'a Table),
    View(&'a View),
}

impl<'a> Relation<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Table(t) => &t.name,
            Self::View(v) => &v.name,
        }
    }

    pub fn columns(&self) -> &'a [Column] {
        match self {
            Self::Table(t) => &t.columns,
            Self::View(v) => &v.columns,
        }
    }
}

impl SchemaDocument {
    pub fn new(tables: Vec<Table>, views: Vec<View>) -> Self {
        Self { tables, views }
    }

    /// Find a table by name or id, falling back to a view by name or id.
    pub fn find_relation(&self, name_or_id: &str) -> Option<Relation<'_>> {
        self.tables
            .iter()
            .find(|t| t.name == name_or_id || (!t.id.is_empty() && t.id == name_or_id))
            .map(Relation::Table)
            .or_else(|| {
                self.views
                    .iter()
                    .find(|v| v.name == name_or_id || (!v.id.is_empty() && v.id == name_or_id))
                    .map(Relation::View)
            })
    }
}
