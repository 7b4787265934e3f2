//! In-memory shop database shared by the unit tests.

use crate::source::DataSource;

pub const SHOP_SQL: &str = "
CREATE SEQUENCE orders_seq START 100;

CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY,
    first_name  VARCHAR,
    last_name   VARCHAR,
    address     VARCHAR
);
CREATE TABLE products (
    product_id   INTEGER PRIMARY KEY,
    product_name VARCHAR,
    category     VARCHAR,
    price        DECIMAL(10,2)
);
CREATE TABLE orders (
    order_id    INTEGER PRIMARY KEY DEFAULT nextval('orders_seq'),
    customer_id INTEGER,
    order_date  TIMESTAMP,
    status      VARCHAR,
    total_price DECIMAL(10,2)
);
CREATE TABLE order_items (
    order_id          INTEGER,
    product_id        INTEGER,
    quantity          INTEGER NOT NULL CHECK (quantity > 0),
    price_at_purchase DECIMAL(10,2)
);
CREATE TABLE payment (payment_method VARCHAR, amount DECIMAL(10,2));
CREATE TABLE shipments (carrier VARCHAR, shipment_date DATE, delivery_date DATE);
CREATE TABLE reviews (review_id INTEGER, product_id INTEGER, rating INTEGER);

INSERT INTO customers VALUES
    (1, 'Ann', 'Lee', 'Almaty'),
    (2, 'Bob', 'Kim', 'Astana'),
    (3, 'Cid', 'Ray', 'Almaty');
INSERT INTO products VALUES
    (1, 'Laptop', 'Electronics', 1000.00),
    (2, 'Phone',  'Electronics',  500.00),
    (3, 'Novel',  'Books',         20.00),
    (4, 'Atlas',  'Books',         35.00);
INSERT INTO orders VALUES
    (1, 1, TIMESTAMP '2024-01-05 10:00:00', 'completed', 1020.00),
    (2, 2, TIMESTAMP '2024-01-20 15:30:00', 'completed',  500.00),
    (3, 3, TIMESTAMP '2024-02-11 09:15:00', 'completed',   40.00),
    (4, 1, TIMESTAMP '2024-03-02 18:45:00', 'completed',  535.00);
INSERT INTO order_items VALUES
    (1, 1, 1, 1000.00),
    (1, 3, 1,   20.00),
    (2, 2, 1,  500.00),
    (3, 3, 2,   20.00),
    (4, 2, 1,  500.00),
    (4, 4, 1,   35.00);
INSERT INTO payment VALUES ('card', 1020.00), ('cash', 500.00), ('card', 575.00);
INSERT INTO shipments VALUES
    ('DHL', DATE '2024-01-06', DATE '2024-01-09'),
    ('UPS', DATE '2024-01-21', DATE '2024-01-23'),
    ('DHL', DATE '2024-02-12', NULL);
INSERT INTO reviews VALUES
    (1, 1, 5), (2, 1, 4), (3, 1, 5), (4, 1, 5), (5, 1, 3), (6, 1, 4),
    (7, 3, 2);
";

/// Fresh in-memory database seeded with [`SHOP_SQL`].
pub fn shop() -> DataSource {
    let ds = DataSource::from_connection_string("duckdb://memory").unwrap();
    ds.execute_batch(SHOP_SQL).unwrap();
    ds
}
