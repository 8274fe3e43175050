//! Prompt assembly.

use crate::{dialect::Dialect, document::ContextItem};

/// Build the instruction prompt for `question`, grounded in `context`.
///
/// Deterministic and total: an empty context yields the same template with an
/// empty knowledge block.
pub fn compose(dialect: Dialect, question: &str, context: &[ContextItem]) -> String {
  let knowledge = context
    .iter()
    .map(|item| format!("- {}", item.content))
    .collect::<Vec<_>>()
    .join("\n");

  let name = dialect.display_name();

  format!(
    "You are a {name} expert. Generate accurate SQL queries based on the provided database knowledge.

RELEVANT DATABASE KNOWLEDGE:
{knowledge}

IMPORTANT RULES:
1. Return ONLY the SQL query, no explanations or markdown
2. Use proper {name} syntax
3. Include appropriate JOINs when querying multiple tables
4. Add LIMIT clause for SELECT * queries (typically LIMIT 10)
5. Use table aliases for better readability
6. For aggregations, use proper GROUP BY clauses
7. Use single quotes for string literals
8. End query with semicolon

USER QUESTION: {question}

SQL QUERY:"
  )
}
