//! Canonical fixture tables: `users`, `orders`, `products`, `reviews`.
//!
//! The data is sized so the classic scenario counts hold: every order
//! matches a user and a product (6 join rows), three products have stock
//! over 100, only Mouse is also `checked = 1`, four products are
//! Electronics and one is Audio, and Laptop is the only reviewed product
//! (twice).

use common::RowMap;
use engine::{Engine, EngineConfig};
use source::SourceIter;
use std::io::Write;
use std::path::{Path, PathBuf};
use types::Value;

/// Build a `RowMap` from name/value pairs.
pub fn row(pairs: &[(&str, Value)]) -> RowMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Restartable producer over fixed rows (fresh iteration per call).
pub fn rows_producer(rows: Vec<RowMap>) -> impl Fn() -> SourceIter + Send + Sync + 'static {
    move || {
        let rows = rows.clone();
        Box::new(rows.into_iter().map(Ok)) as SourceIter
    }
}

pub fn users_rows() -> Vec<RowMap> {
    vec![
        row(&[
            ("id", Value::Int(1)),
            ("name", Value::Text("Alice".into())),
            ("age", Value::Int(30)),
            ("city", Value::Text("New York".into())),
        ]),
        row(&[
            ("id", Value::Int(2)),
            ("name", Value::Text("Bob".into())),
            ("age", Value::Int(25)),
            ("city", Value::Text("Los Angeles".into())),
        ]),
        row(&[
            ("id", Value::Int(3)),
            ("name", Value::Text("Charlie".into())),
            ("age", Value::Int(35)),
            ("city", Value::Text("Chicago".into())),
        ]),
        row(&[
            ("id", Value::Int(4)),
            ("name", Value::Text("Diana".into())),
            ("age", Value::Int(28)),
            ("city", Value::Text("Houston".into())),
        ]),
    ]
}

pub fn orders_rows() -> Vec<RowMap> {
    let order = |order_id: i64, user_id: i64, product: &str, price: f64, quantity: i64| {
        row(&[
            ("order_id", Value::Int(order_id)),
            ("user_id", Value::Int(user_id)),
            ("product", Value::Text(product.into())),
            ("price", Value::Float(price)),
            ("quantity", Value::Int(quantity)),
        ])
    };
    vec![
        order(101, 1, "Laptop", 1200.0, 1),
        order(102, 1, "Mouse", 25.5, 2),
        order(103, 2, "Keyboard", 85.0, 1),
        order(104, 3, "Monitor", 320.0, 2),
        order(105, 4, "Headphones", 75.5, 1),
        order(106, 2, "USB Cable", 12.0, 3),
    ]
}

/// Orders re-sorted non-descending on `user_id` (for sort-merge runs).
pub fn orders_rows_by_user_id() -> Vec<RowMap> {
    let mut rows = orders_rows();
    rows.sort_by_key(|r| match &r["user_id"] {
        Value::Int(id) => *id,
        other => panic!("unexpected user_id {other:?}"),
    });
    rows
}

pub fn products_rows() -> Vec<RowMap> {
    let product =
        |product_id: i64, name: &str, category: &str, stock: i64, checked: i64, price: f64| {
            row(&[
                ("product_id", Value::Int(product_id)),
                ("name", Value::Text(name.into())),
                ("category", Value::Text(category.into())),
                ("stock", Value::Int(stock)),
                ("checked", Value::Int(checked)),
                ("price", Value::Float(price)),
            ])
        };
    vec![
        product(1, "Laptop", "Electronics", 10, 1, 999.99),
        product(2, "Mouse", "Electronics", 200, 1, 19.99),
        product(3, "Keyboard", "Electronics", 150, 0, 49.5),
        product(4, "Monitor", "Electronics", 30, 0, 249.0),
        product(5, "Headphones", "Audio", 45, 0, 79.99),
        product(6, "USB Cable", "Accessories", 500, 0, 5.49),
    ]
}

pub fn reviews_rows() -> Vec<RowMap> {
    vec![
        row(&[
            ("review_id", Value::Int(1001)),
            ("product_id", Value::Int(1)),
            ("user_id", Value::Int(1)),
            ("rating", Value::Int(5)),
            ("comment", Value::Text("Great laptop".into())),
        ]),
        row(&[
            ("review_id", Value::Int(1002)),
            ("product_id", Value::Int(1)),
            ("user_id", Value::Int(2)),
            ("rating", Value::Int(4)),
            ("comment", Value::Text("Solid machine".into())),
        ]),
    ]
}

/// Engine with all four fixture tables registered.
pub fn fixture_engine() -> Engine {
    fixture_engine_with(EngineConfig::default())
}

/// Engine with all four fixture tables and the given configuration.
pub fn fixture_engine_with(config: EngineConfig) -> Engine {
    let mut engine = Engine::with_config(config);
    engine
        .register()
        .name("users")
        .producer(rows_producer(users_rows()))
        .call();
    engine
        .register()
        .name("orders")
        .producer(rows_producer(orders_rows()))
        .call();
    engine
        .register()
        .name("products")
        .producer(rows_producer(products_rows()))
        .call();
    engine
        .register()
        .name("reviews")
        .producer(rows_producer(reviews_rows()))
        .call();
    engine
}

/// Write rows as a JSON-lines file under `dir` and return its path.
pub fn write_jsonl(dir: &Path, name: &str, rows: &[RowMap]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create jsonl fixture");
    for row in rows {
        let line = serde_json::to_string(row).expect("serialize fixture row");
        writeln!(file, "{line}").expect("write fixture row");
    }
    path
}
