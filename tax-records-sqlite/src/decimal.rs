use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};
use tax_core::StoreError;

/// Get a decimal value from a row.
///
/// Money is written as TEXT so no precision is lost; INTEGER and REAL cells,
/// e.g. from rows edited by hand, are accepted too.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, StoreError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| StoreError::Storage(format!("Column '{column}' not found: {e}")))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                StoreError::Storage(format!("Failed to get TEXT from '{column}': {e}"))
            })?;
            val.trim().parse::<Decimal>().map_err(|e| {
                StoreError::Storage(format!("Failed to parse decimal '{val}' in '{column}': {e}"))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                StoreError::Storage(format!("Failed to get INTEGER from '{column}': {e}"))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                StoreError::Storage(format!("Failed to get REAL from '{column}': {e}"))
            })?;
            Decimal::try_from(val).map_err(|e| {
                StoreError::Storage(format!("Failed to convert {val} to Decimal: {e}"))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        _ => Err(StoreError::Storage(format!(
            "Unexpected type '{type_name}' for column '{column}'"
        ))),
    }
}
