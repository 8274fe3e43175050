//! Static domain knowledge seeded alongside the introspected schema:
//! relationships, query patterns, worked examples and dialect tips.
//!
//! None of this is derived from the database. The examples are written
//! against the sample `users` / `orders` schema.

use crate::{
  dialect::Dialect,
  document::{DocumentKind, NewDocument},
};

/// Purpose sentence for a table, used in its schema document.
pub fn table_purpose(table: &str) -> &'static str {
  match table {
    "users" => "customer information including personal details and location",
    "orders" => "purchase records with product details and amounts",
    "query_history" => "system log of generated SQL queries",
    _ => "data records",
  }
}

/// Every static document, in insertion order.
pub fn static_documents(dialect: Dialect) -> Vec<NewDocument> {
  let mut docs = relationships();
  docs.extend(patterns());
  docs.extend(examples());
  docs.extend(tips(dialect));
  docs
}

fn relationships() -> Vec<NewDocument> {
  vec![
    NewDocument::new(
      "users_orders_relationship",
      DocumentKind::Relationship,
      "users and orders tables are related through user_id. orders.user_id is a foreign key referencing users.id. To get user information with their orders, use JOIN: SELECT u.name, o.product FROM users u JOIN orders o ON u.id = o.user_id",
    )
    .with("tables", vec!["users", "orders"]),
  ]
}

fn pattern(id: &str, intent: &str, content: &str) -> NewDocument {
  NewDocument::new(id, DocumentKind::Pattern, content).with("intent", intent)
}

fn patterns() -> Vec<NewDocument> {
  vec![
    pattern(
      "basic_select",
      "basic_select",
      "To show all records from a table: SELECT * FROM table_name LIMIT 10",
    ),
    pattern(
      "filter_by_column",
      "filter",
      "To filter records by a column value: SELECT * FROM table_name WHERE column_name = 'value'",
    ),
    pattern(
      "count_records",
      "count",
      "To count records: SELECT COUNT(*) FROM table_name. To count by group: SELECT column_name, COUNT(*) FROM table_name GROUP BY column_name",
    ),
    pattern(
      "join_tables",
      "join",
      "To join users with orders: SELECT u.name, u.email, o.product, o.amount FROM users u JOIN orders o ON u.id = o.user_id",
    ),
    pattern(
      "aggregation",
      "aggregation",
      "For aggregations like sum, average: SELECT SUM(amount) as total, AVG(amount) as average FROM orders. Group by user: SELECT u.name, SUM(o.amount) as total FROM users u JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.name",
    ),
    pattern(
      "sorting",
      "sorting",
      "To sort results: SELECT * FROM table_name ORDER BY column_name ASC/DESC. For latest records: ORDER BY date_column DESC LIMIT 10",
    ),
  ]
}

fn example(id: &str, intent: &str, content: &str) -> NewDocument {
  NewDocument::new(id, DocumentKind::Example, content).with("intent", intent)
}

fn examples() -> Vec<NewDocument> {
  vec![
    example(
      "users_by_city",
      "location_filter",
      "To find users from a specific city: SELECT * FROM users WHERE city = 'New York'. To find users from multiple cities: SELECT * FROM users WHERE city IN ('New York', 'Chicago')",
    ),
    example(
      "orders_by_amount",
      "amount_filter",
      "To find orders above certain amount: SELECT * FROM orders WHERE amount > 500. To find expensive orders with user info: SELECT u.name, o.product, o.amount FROM users u JOIN orders o ON u.id = o.user_id WHERE o.amount > 500",
    ),
    example(
      "recent_orders",
      "recent_data",
      "To find recent orders: SELECT * FROM orders ORDER BY order_date DESC LIMIT 10. To find orders from specific date: SELECT * FROM orders WHERE order_date >= '2024-01-01'",
    ),
    example(
      "user_order_summary",
      "user_summary",
      "To get user order summary: SELECT u.name, COUNT(o.id) as order_count, SUM(o.amount) as total_spent FROM users u LEFT JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.name",
    ),
    example(
      "top_customers",
      "top_customers",
      "To find top customers by spending: SELECT u.name, SUM(o.amount) as total_spent FROM users u JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.name ORDER BY total_spent DESC LIMIT 10",
    ),
    example(
      "age_filter",
      "age_filter",
      "To filter users by age: SELECT * FROM users WHERE age > 25. To find users in age range: SELECT * FROM users WHERE age BETWEEN 25 AND 50",
    ),
  ]
}

fn tip(id: &str, intent: &str, content: &str) -> NewDocument {
  NewDocument::new(id, DocumentKind::Tip, content).with("intent", intent)
}

fn tips(dialect: Dialect) -> Vec<NewDocument> {
  match dialect {
    Dialect::Postgres => vec![
      tip(
        "postgres_string_matching",
        "string_matching",
        "For PostgreSQL string matching: Use LIKE for patterns (LIKE '%pattern%'), ILIKE for case-insensitive matching, or ~ for regex matching",
      ),
      tip(
        "postgres_date_functions",
        "date_functions",
        "PostgreSQL date functions: Use CURRENT_DATE for today, EXTRACT(YEAR FROM date_column) for year, DATE_TRUNC('month', date_column) for month grouping",
      ),
      tip(
        "postgres_limits",
        "pagination",
        "Always use LIMIT in PostgreSQL for large result sets. For pagination, use LIMIT with OFFSET: SELECT * FROM table LIMIT 10 OFFSET 20",
      ),
    ],
    Dialect::Sqlite => vec![
      tip(
        "sqlite_string_matching",
        "string_matching",
        "For SQLite string matching: LIKE is case-insensitive for ASCII (LIKE '%pattern%'), use GLOB for case-sensitive patterns (GLOB '*Pattern*'), or LOWER(column) = LOWER('value') for exact case-insensitive matches",
      ),
      tip(
        "sqlite_date_functions",
        "date_functions",
        "SQLite date functions: Use DATE('now') for today, strftime('%Y', date_column) for year, strftime('%Y-%m', date_column) for month grouping, DATE('now', '-7 days') for relative dates",
      ),
      tip(
        "sqlite_limits",
        "pagination",
        "Always use LIMIT in SQLite for large result sets. For pagination, use LIMIT with OFFSET: SELECT * FROM table LIMIT 10 OFFSET 20",
      ),
    ],
  }
}
