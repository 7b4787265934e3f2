// src/catalog.rs
//
// Every SQL statement the reports run, keyed by report name. Named bind
// parameters are written `:name`.

use anyhow::Result;

use crate::error::ReportError;
use crate::source::{Params, Scalar};

/// A named, parameterized SQL template.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub name: &'static str,
    pub sql: &'static str,
    pub params: Params,
}

impl QuerySpec {
    pub fn new(name: &'static str, sql: &'static str) -> Self {
        Self {
            name,
            sql,
            params: Params::new(),
        }
    }

    /// Bind `value` to `:key`.
    pub fn bind(mut self, key: &str, value: impl Into<Scalar>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

static CATALOG: &[(&str, &str)] = &[
    // ─── chart reports ──────────────────────────────────────────────
    (
        "revenue_by_category",
        "SELECT p.category AS category_name,
                SUM(oi.quantity * oi.price_at_purchase) AS revenue
         FROM order_items oi
         JOIN products p ON p.product_id = oi.product_id
         JOIN orders o   ON o.order_id   = oi.order_id
         GROUP BY p.category
         ORDER BY revenue DESC",
    ),
    (
        "top_products",
        "SELECT p.product_name,
                SUM(oi.quantity * oi.price_at_purchase) AS revenue
         FROM order_items oi
         JOIN products p ON p.product_id = oi.product_id
         JOIN orders o   ON o.order_id   = oi.order_id
         GROUP BY p.product_name
         ORDER BY revenue DESC
         LIMIT 10",
    ),
    (
        "aov_by_address",
        "WITH order_totals AS (
           SELECT o.order_id, SUM(oi.quantity * oi.price_at_purchase) AS order_total
           FROM orders o
           JOIN order_items oi ON oi.order_id = o.order_id
           GROUP BY o.order_id
         )
         SELECT c.address AS address_name,
                AVG(ot.order_total) AS avg_order_value
         FROM orders o
         JOIN customers c     ON c.customer_id = o.customer_id
         JOIN order_totals ot ON ot.order_id   = o.order_id
         GROUP BY c.address
         ORDER BY avg_order_value DESC
         LIMIT 10",
    ),
    (
        "monthly_revenue_by_category",
        "SELECT DATE_TRUNC('month', o.order_date)::date AS month,
                p.category AS category_name,
                SUM(oi.quantity * oi.price_at_purchase) AS revenue
         FROM orders o
         JOIN order_items oi ON oi.order_id  = o.order_id
         JOIN products p     ON p.product_id = oi.product_id
         GROUP BY month, p.category
         ORDER BY month, p.category",
    ),
    (
        "order_totals",
        "SELECT o.order_id,
                SUM(oi.quantity * oi.price_at_purchase) AS order_total
         FROM orders o
         JOIN order_items oi ON oi.order_id    = o.order_id
         JOIN customers c    ON c.customer_id  = o.customer_id
         GROUP BY o.order_id",
    ),
    (
        "price_vs_qty",
        "SELECT p.product_name,
                p.price AS product_price,
                SUM(oi.quantity) AS qty_sold
         FROM order_items oi
         JOIN products p ON p.product_id = oi.product_id
         JOIN orders o   ON o.order_id   = oi.order_id
         GROUP BY p.product_name, p.price
         ORDER BY qty_sold DESC",
    ),
    // ─── spreadsheet export ─────────────────────────────────────────
    ("orders_sample", "SELECT * FROM orders LIMIT 1000"),
    (
        "items_with_products",
        "SELECT oi.*, p.product_name
         FROM order_items oi
         JOIN products p ON p.product_id = oi.product_id
         LIMIT 1000",
    ),
    // ─── exploratory batch ──────────────────────────────────────────
    ("sample_orders", "SELECT * FROM orders LIMIT 10"),
    (
        "monthly_revenue",
        "WITH monthly AS (
           SELECT DATE_TRUNC('month', o.order_date) AS mon,
                  SUM(oi.quantity * oi.price_at_purchase) AS revenue
           FROM orders o
           JOIN order_items oi ON oi.order_id = o.order_id
           GROUP BY 1
         )
         SELECT mon, revenue
         FROM monthly
         ORDER BY mon",
    ),
    (
        "top_products_by_id",
        "SELECT p.product_id, p.product_name,
                SUM(oi.quantity * oi.price_at_purchase) AS revenue
         FROM order_items oi
         JOIN products p ON p.product_id = oi.product_id
         GROUP BY p.product_id, p.product_name
         ORDER BY revenue DESC
         LIMIT 10",
    ),
    (
        "average_order_value",
        "SELECT ROUND(AVG(total_price), 2) AS avg_order_value
         FROM orders",
    ),
    (
        "payment_methods",
        "SELECT payment_method, COUNT(*) AS cnt, ROUND(SUM(amount), 2) AS total
         FROM payment
         GROUP BY payment_method
         ORDER BY total DESC",
    ),
    (
        "shipment_speed",
        "SELECT carrier,
                ROUND(AVG(delivery_date - shipment_date), 2) AS avg_days
         FROM shipments
         WHERE delivery_date IS NOT NULL AND shipment_date IS NOT NULL
         GROUP BY carrier
         ORDER BY avg_days",
    ),
    (
        "customer_top_spenders",
        "SELECT c.customer_id, c.first_name, c.last_name,
                ROUND(SUM(o.total_price), 2) AS total_spent
         FROM customers c
         JOIN orders o ON o.customer_id = c.customer_id
         GROUP BY c.customer_id, c.first_name, c.last_name
         ORDER BY total_spent DESC
         LIMIT 10",
    ),
    (
        "product_ratings",
        "SELECT p.product_name,
                ROUND(AVG(r.rating), 2) AS avg_rating,
                COUNT(r.review_id) AS reviews_count
         FROM reviews r
         JOIN products p ON r.product_id = p.product_id
         GROUP BY p.product_name
         HAVING COUNT(r.review_id) > 5
         ORDER BY avg_rating DESC, reviews_count DESC
         LIMIT 10",
    ),
    // ─── schema introspection ───────────────────────────────────────
    (
        "list_tables",
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = :schema
           AND table_catalog = current_database()
         ORDER BY 1",
    ),
    (
        "describe_table",
        "SELECT column_name, data_type
         FROM information_schema.columns
         WHERE table_schema = :schema
           AND table_name = :table
           AND table_catalog = current_database()
         ORDER BY ordinal_position",
    ),
    // ─── demo mutation ──────────────────────────────────────────────
    (
        "insert_demo_order",
        "INSERT INTO orders (customer_id, order_date, status)
         VALUES (:customer_id, NOW()::timestamp, 'completed')
         RETURNING order_id",
    ),
    (
        "insert_demo_order_item",
        "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
         VALUES (:order_id, :product_id, :quantity, :price)",
    ),
];

/// Queries run by the exploratory runner, in print order.
pub const EXPLORATORY: &[&str] = &[
    "sample_orders",
    "monthly_revenue",
    "top_products_by_id",
    "average_order_value",
    "payment_methods",
    "shipment_speed",
    "customer_top_spenders",
    "product_ratings",
];

/// Look up a report's query by name.
pub fn get(name: &str) -> Result<QuerySpec> {
    CATALOG
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(n, sql)| QuerySpec::new(n, sql))
        .ok_or_else(|| ReportError::UnknownReport(name.to_string()).into())
}

/// All report names, in catalog order.
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(n, _)| *n)
}
