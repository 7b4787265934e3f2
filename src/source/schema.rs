use anyhow::{Context, Result};

use super::{DataSource, ResultSet, Scalar};
use crate::catalog;

/// Table names in the shop schema, sorted.
pub fn list_tables(ds: &DataSource) -> Result<Vec<String>> {
    let q = catalog::get("list_tables")?.bind("schema", ds.default_schema());
    let rs = ds.fetch(&q)?;
    let col = rs
        .column("table_name")
        .context("list_tables returned no `table_name` column")?;
    Ok(col
        .values
        .iter()
        .filter(|v| !v.is_null())
        .map(Scalar::to_string)
        .collect())
}

/// `column_name`, `data_type` for one table in ordinal order. Empty when the
/// table does not exist.
pub fn describe_table(ds: &DataSource, table: &str) -> Result<ResultSet> {
    let q = catalog::get("describe_table")?
        .bind("schema", ds.default_schema())
        .bind("table", table);
    ds.fetch(&q)
}

/// Print every table followed by its columns.
pub fn print_schema(ds: &DataSource) -> Result<()> {
    let tables = list_tables(ds)?;
    println!("\n== TABLES ==");
    for t in &tables {
        println!(" - {}", t);
    }
    println!("\n== COLUMNS by table ==");
    for t in &tables {
        let cols = describe_table(ds, t)?;
        println!("\n[{}]", t);
        for r in 0..cols.row_count() {
            let name = cols.value(r, 0).map(Scalar::to_string).unwrap_or_default();
            let ty = cols.value(r, 1).map(Scalar::to_string).unwrap_or_default();
            println!("  {:20} {}", name, ty);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    #[test]
    fn test_list_tables() {
        let ds = fixture::shop();
        let tables = list_tables(&ds).unwrap();
        assert_eq!(
            tables,
            vec![
                "customers",
                "order_items",
                "orders",
                "payment",
                "products",
                "reviews",
                "shipments"
            ]
        );
    }

    #[test]
    fn test_describe_table() {
        let ds = fixture::shop();
        let cols = describe_table(&ds, "order_items").unwrap();
        let names: Vec<String> = cols
            .column("column_name")
            .unwrap()
            .values
            .iter()
            .map(Scalar::to_string)
            .collect();
        assert_eq!(
            names,
            vec!["order_id", "product_id", "quantity", "price_at_purchase"]
        );
        assert_eq!(cols.value(2, 1), Some(&Scalar::from("INTEGER")));
    }

    #[test]
    fn test_describe_missing_table_is_empty() {
        let ds = fixture::shop();
        let cols = describe_table(&ds, "nope").unwrap();
        assert!(cols.is_empty());
    }

    #[test]
    fn test_print_schema() {
        let ds = fixture::shop();
        print_schema(&ds).unwrap();
    }
}
