// reelstar-core/src/domain/sql/quoter.rs

use sqlparser::ast::Ident;

/// Quotes an identifier ("field_name") so table and column names coming from
/// configuration or a CSV header are safe in generated SQL.
pub fn quote_ident(name: &str) -> String {
    Ident::with_quote('"', name).to_string()
}
