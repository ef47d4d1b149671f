//! Prompt text for the generative model.

use crate::models::{DataSource, Report};

/// Prompt asking for `row_count` mock rows shaped like the report's columns.
pub fn rows_prompt(data_source: &DataSource, report: &Report, row_count: u32) -> String {
    let schema = data_source
        .tables
        .iter()
        .filter(|t| t.exposed)
        .map(|t| {
            let columns = t
                .columns
                .iter()
                .map(|c| format!("{} ({})", c.name, c.column_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Table: {}\nColumns: {}", t.name, columns)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let columns = report
        .selected_columns
        .iter()
        .map(|selected| {
            let table = data_source.table_by_id(&selected.table_id);
            let column = table.and_then(|t| t.columns.iter().find(|c| c.id == selected.column_id));
            format!(
                "{}.{}",
                table.map_or("undefined", |t| t.name.as_str()),
                column.map_or("undefined", |c| c.name.as_str())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let filters = serde_json::to_string(&report.filters).unwrap_or_else(|_| "[]".to_string());
    let sorts = serde_json::to_string(&report.sorts).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Generate {row_count} rows of realistic mock data for a report.\n\n\
         Data Source Schema:\n{schema}\n\n\
         Report Requirements:\n\
         - Columns needed: {columns}\n\
         - Filters to apply (simulated): {filters}\n\
         - Sorting: {sorts}\n\n\
         Return ONLY a JSON array of objects. Keys should match the requested columns. \
         Make the data consistent and realistic."
    )
}

/// Prompt asking for a small invented schema for a database of `db_type`.
pub fn schema_prompt(db_type: &str, db_name: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "General business database"
    } else {
        context
    };

    format!(
        "You are a database architect.\n\
         Generate a schema for a '{db_type}' database named '{db_name}'.\n\
         Context: {context}.\n\n\
         Constraints:\n\
         1. Generate EXACTLY 3 tables.\n\
         2. Each table has MAX 5 columns.\n\
         3. Descriptions must be concise (< 10 words).\n\
         4. sampleValues must be short strings.\n\
         5. Output valid JSON.\n\n\
         For each table/column include: name, alias, description, sampleValue. \
         Column types must be one of: \"string\", \"number\", \"date\", \"boolean\", \"currency\"."
    )
}
