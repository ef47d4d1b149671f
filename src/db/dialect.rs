//! SQL dialects and bounded statement building.
//!
//! Identifiers reaching [`build_select`] have already been checked against a
//! schema document; quoting here keeps a whitelisted name that contains a
//! delimiter from breaking out of its identifier.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Supported external database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    SqlServer,
}

impl Dialect {
    /// Parse a data source `type` field. Case-insensitive.
    pub fn parse(source_type: &str) -> Option<Self> {
        match source_type.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sql" | "mssql" | "sqlserver" => Some(Self::SqlServer),
            _ => None,
        }
    }

    /// Like [`Dialect::parse`] but rejects unknown types with a validation error.
    pub fn require(source_type: &str) -> AppResult<Self> {
        Self::parse(source_type).ok_or_else(|| AppError::unsupported_type(source_type))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::SqlServer => "SQL Server",
        }
    }

    /// Fixed schema every catalog query and select targets.
    pub fn default_schema(&self) -> &'static str {
        match self {
            Self::Postgres => "public",
            Self::SqlServer => "dbo",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::SqlServer => 1433,
        }
    }

    pub fn default_database(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::SqlServer => "master",
        }
    }

    /// Native UUID type name, lowercase.
    pub fn uuid_type(&self) -> &'static str {
        match self {
            Self::Postgres => "uuid",
            Self::SqlServer => "uniqueidentifier",
        }
    }

    /// Whether foreign key, index and constraint fetches degrade to an empty
    /// list instead of failing the whole discovery.
    pub fn tolerates_metadata_errors(&self) -> bool {
        matches!(self, Self::SqlServer)
    }

    /// Positional placeholder for the `n`th (1-based) bound parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::SqlServer => format!("@P{n}"),
        }
    }

    /// Quote an identifier.
    ///
    /// Postgres wraps in `"` and doubles embedded quotes. SQL Server wraps in
    /// `[...]` and drops any bracket characters from the name.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::SqlServer => {
                let stripped: String = ident.chars().filter(|c| *c != '[' && *c != ']').collect();
                format!("[{stripped}]")
            }
        }
    }

    /// Schema-qualified, quoted relation name.
    pub fn qualified(&self, relation: &str) -> String {
        format!(
            "{}.{}",
            self.quote_ident(self.default_schema()),
            self.quote_ident(relation)
        )
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Build a bounded `SELECT` over whitelisted columns of one relation.
///
/// Postgres binds the limit as `$1`. SQL Server has no parameterized `TOP`
/// without parentheses, so the already-validated integer is inlined.
pub fn build_select(dialect: Dialect, relation: &str, columns: &[String], limit: u32) -> SelectStatement {
    let cols = columns
        .iter()
        .map(|c| dialect.quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let from = dialect.qualified(relation);

    match dialect {
        Dialect::Postgres => SelectStatement {
            sql: format!("SELECT {cols} FROM {from} LIMIT {}", dialect.placeholder(1)),
            params: vec![SqlParam::Int(i64::from(limit))],
        },
        Dialect::SqlServer => SelectStatement {
            sql: format!("SELECT TOP ({limit}) {cols} FROM {from}"),
            params: Vec::new(),
        },
    }
}
