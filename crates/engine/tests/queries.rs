//! End-to-end query tests over the canonical fixture tables.

use engine::{Engine, Value};
use pretty_assertions::assert_eq;
use source::SourceIter;
use testsupport::prelude::*;

fn rows_for(engine: &Engine, sql: &str) -> Vec<engine::RowMap> {
    collect_rows(engine.query(sql).expect("query should plan"))
}

#[test]
fn join_emits_one_row_per_order() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT users.name, users.city, orders.product, orders.price \
         FROM users JOIN orders ON users.id = orders.user_id",
    );

    assert_eq!(rows.len(), 6);
    // Lookup join preserves the left (users) order.
    assert_eq!(
        text_column(&rows, "users.name"),
        ["Alice", "Alice", "Bob", "Bob", "Charlie", "Diana"]
    );
    assert_eq!(
        text_column(&rows, "orders.product"),
        ["Laptop", "Mouse", "Keyboard", "USB Cable", "Monitor", "Headphones"]
    );
}

#[test]
fn where_filters_on_a_single_table() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name, products.stock FROM products WHERE products.stock > 100",
    );

    assert_eq!(rows.len(), 3);
    assert_eq!(
        text_column(&rows, "products.name"),
        ["Mouse", "Keyboard", "USB Cable"]
    );
}

#[test]
fn where_with_and_narrows_to_checked_products() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products \
         WHERE products.stock > 100 AND products.checked = 1",
    );

    assert_eq!(text_column(&rows, "products.name"), ["Mouse"]);
}

#[test]
fn where_with_or_spans_categories() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products \
         WHERE products.category = 'Electronics' OR products.category = 'Audio'",
    );

    assert_eq!(rows.len(), 5);
}

#[test]
fn in_list_matches_or_chain() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products \
         WHERE products.category IN ('Electronics', 'Audio')",
    );

    assert_eq!(rows.len(), 5);
}

#[test]
fn is_not_null_keeps_every_product() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products WHERE products.stock IS NOT NULL",
    );

    assert_eq!(rows.len(), 6);
}

#[test]
fn left_join_pads_unreviewed_products() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name, reviews.rating FROM products \
         LEFT JOIN reviews ON products.product_id = reviews.product_id",
    );

    // 6 products, Laptop reviewed twice: 7 rows.
    assert_eq!(rows.len(), 7);
    let laptop_rows: Vec<_> = rows
        .iter()
        .filter(|r| r["products.name"] == Value::Text("Laptop".into()))
        .collect();
    assert_eq!(laptop_rows.len(), 2);
    let null_ratings = rows
        .iter()
        .filter(|r| r["reviews.rating"] == Value::Null)
        .count();
    assert_eq!(null_ratings, 5);
}

#[test]
fn where_on_nullable_side_stays_above_the_left_join() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products \
         LEFT JOIN reviews ON products.product_id = reviews.product_id \
         WHERE reviews.rating IS NULL",
    );

    // Exactly the unreviewed products survive.
    assert_eq!(rows.len(), 5);
    assert!(!text_column(&rows, "products.name").contains(&"Laptop".to_string()));
}

#[test]
fn three_table_join_carries_all_qualifiers() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT users.name, orders.product, products.category \
         FROM users \
         JOIN orders ON users.id = orders.user_id \
         JOIN products ON orders.product = products.name",
    );

    assert_eq!(rows.len(), 6);
}

#[test]
fn cross_table_where_applies_after_the_join() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT users.name, orders.price \
         FROM users JOIN orders ON users.id = orders.user_id \
         WHERE orders.price > 100 AND users.age >= 30",
    );

    assert_eq!(rows.len(), 2);
    assert_eq!(text_column(&rows, "users.name"), ["Alice", "Charlie"]);
}

#[test]
fn aliases_rename_output_columns() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT users.name AS user_name, orders.product AS item \
         FROM users JOIN orders ON users.id = orders.user_id",
    );

    assert_eq!(rows.len(), 6);
    assert!(rows[0].contains_key("user_name"));
    assert!(rows[0].contains_key("item"));
}

#[test]
fn arithmetic_projection_computes_per_row() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT orders.product, orders.price * orders.quantity AS total FROM orders",
    );

    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["total"], Value::Float(1200.0));
    assert_eq!(rows[1]["total"], Value::Float(51.0));
}

#[test]
fn unaliased_expression_uses_canonical_text() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT orders.price * orders.quantity FROM orders",
    );
    assert!(rows[0].contains_key("orders.price * orders.quantity"));
}

#[test]
fn bare_columns_resolve_across_the_from_list() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT name, product FROM users JOIN orders ON id = user_id",
    );

    assert_eq!(rows.len(), 6);
    assert!(rows[0].contains_key("name"));
    assert!(rows[0].contains_key("product"));
}

#[test]
fn mixed_kind_comparison_drops_rows_silently() {
    let engine = fixture_engine();
    let rows = rows_for(
        &engine,
        "SELECT products.name FROM products WHERE products.stock > 'many'",
    );
    assert!(rows.is_empty());
}

#[test]
fn running_the_same_query_twice_restarts_producers() {
    let engine = fixture_engine();
    let sql = "SELECT users.name, orders.product \
               FROM users JOIN orders ON users.id = orders.user_id";

    let first = rows_for(&engine, sql);
    let second = rows_for(&engine, sql);
    assert_eq!(first, second);
}

#[test]
fn abandoning_an_iterator_leaves_the_engine_usable() {
    let engine = fixture_engine();
    let mut rows = engine
        .query("SELECT users.name FROM users JOIN orders ON users.id = orders.user_id")
        .unwrap();
    let _ = rows.next();
    drop(rows);

    let again = rows_for(&engine, "SELECT users.name FROM users");
    assert_eq!(again.len(), 4);
}

#[test]
fn planning_errors_surface_before_any_row() {
    let engine = fixture_engine();

    assert_error_contains(
        engine.query("SELECT missing.x FROM missing").map(|_| ()),
        "unknown table",
    );
    assert_error_contains(
        engine.query("SELECT nonexistent FROM users").map(|_| ()),
        "unresolved column",
    );
    assert_error_contains(
        engine
            .query("SELECT user_id FROM orders JOIN reviews ON orders.user_id = reviews.user_id")
            .map(|_| ()),
        "ambiguous column",
    );
    assert_error_contains(
        engine.query("SELECT COUNT(users.id) FROM users").map(|_| ()),
        "unsupported expression",
    );
}

#[test]
fn producer_errors_surface_mid_stream_with_the_table_name() {
    let mut engine = Engine::new();
    engine
        .register()
        .name("flaky")
        .producer(|| {
            let rows: Vec<Result<_, source::SourceError>> = vec![
                Ok(row(&[("id", Value::Int(1))])),
                Err("stream reset".into()),
            ];
            Box::new(rows.into_iter()) as SourceIter
        })
        .call();

    let mut rows = engine.query("SELECT flaky.id FROM flaky").unwrap();

    let first = rows.next().unwrap().unwrap();
    assert_eq!(first["flaky.id"], Value::Int(1));

    let err = rows.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("flaky"));
    assert!(err.to_string().contains("stream reset"));

    // Fused after the error.
    assert!(rows.next().is_none());
}

#[test]
fn last_registration_wins() {
    let mut engine = Engine::new();
    engine
        .register()
        .name("t")
        .producer(rows_producer(vec![row(&[("v", Value::Int(1))])]))
        .call();
    engine
        .register()
        .name("t")
        .producer(rows_producer(vec![
            row(&[("v", Value::Int(2))]),
            row(&[("v", Value::Int(3))]),
        ]))
        .call();

    let rows = rows_for(&engine, "SELECT t.v FROM t");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["t.v"], Value::Int(2));
}
