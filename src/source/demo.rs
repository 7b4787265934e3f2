use anyhow::Result;
use tracing::info;

use super::{execute_on, query_i64_on, DataSource};
use crate::catalog;

/// One synthetic order with a single line item.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOrder {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

impl Default for DemoOrder {
    fn default() -> Self {
        Self {
            customer_id: 1,
            product_id: 1,
            quantity: 1,
            price: 100.0,
        }
    }
}

/// Insert the order header and its line item in one transaction.
///
/// Either both rows are committed or neither is. Returns the new order id.
pub fn insert_demo_order(ds: &DataSource, demo: &DemoOrder) -> Result<i64> {
    let order_id = ds.transaction("demo_insert", |conn| {
        let header = catalog::get("insert_demo_order")?.bind("customer_id", demo.customer_id);
        let order_id = query_i64_on(conn, &header)?;

        let item = catalog::get("insert_demo_order_item")?
            .bind("order_id", order_id)
            .bind("product_id", demo.product_id)
            .bind("quantity", demo.quantity)
            .bind("price", demo.price);
        execute_on(conn, &item)?;
        Ok(order_id)
    })?;

    info!(order_id, "inserted demo order");
    Ok(order_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuerySpec;
    use crate::error::ReportError;
    use crate::fixture;
    use crate::source::Scalar;

    fn count(ds: &DataSource, sql: &'static str) -> i64 {
        ds.fetch(&QuerySpec::new("count", sql))
            .unwrap()
            .value(0, 0)
            .and_then(Scalar::as_i64)
            .unwrap()
    }

    #[test]
    fn test_commits_header_and_item() {
        let ds = fixture::shop();
        let order_id = insert_demo_order(&ds, &DemoOrder::default()).unwrap();
        assert_eq!(order_id, 100);

        let q = QuerySpec::new(
            "check",
            "SELECT COUNT(*) FROM orders o JOIN order_items oi ON oi.order_id = o.order_id
             WHERE o.order_id = :id",
        )
        .bind("id", order_id);
        let rs = ds.fetch(&q).unwrap();
        assert_eq!(rs.value(0, 0), Some(&Scalar::Int(1)));
    }

    #[test]
    fn test_failed_item_leaves_no_header() {
        let ds = fixture::shop();
        let orders_before = count(&ds, "SELECT COUNT(*) FROM orders");
        let items_before = count(&ds, "SELECT COUNT(*) FROM order_items");

        // quantity 0 violates the CHECK on order_items after the header insert
        let bad = DemoOrder {
            quantity: 0,
            ..DemoOrder::default()
        };
        let err = insert_demo_order(&ds, &bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::Transaction { .. })
        ));

        assert_eq!(count(&ds, "SELECT COUNT(*) FROM orders"), orders_before);
        assert_eq!(count(&ds, "SELECT COUNT(*) FROM order_items"), items_before);
    }

    #[test]
    fn test_reports_see_fresh_data() {
        let ds = fixture::shop();
        let revenue = |ds: &DataSource| {
            let rs = ds.fetch(&catalog::get("revenue_by_category").unwrap()).unwrap();
            rs.column("revenue")
                .unwrap()
                .values
                .iter()
                .filter_map(Scalar::as_f64)
                .sum::<f64>()
        };
        let before = revenue(&ds);
        insert_demo_order(&ds, &DemoOrder::default()).unwrap();
        assert_eq!(revenue(&ds), before + 100.0);
    }
}
