//! Normalisation of raw model output into a single terminated statement.
//!
//! [`clean_sql`] is total: any string goes in, a `;`-terminated string comes
//! out. Whether anything executable survived is a separate question answered
//! by [`has_statement`].

/// Clean a model response.
///
/// 1. If the response contains a ```` ``` ```` fence, keep only the text of
///    the first fenced block (a language tag such as `sql` on the fence line
///    is dropped).
/// 2. Trim every line; drop blank lines and lines that start with `--`
///    unless they start with `-- ` (a spaced comment is kept).
/// 3. Drop comments trailing the last statement, whole-line or inline.
/// 4. Append `;` if the result does not already end with one.
pub fn clean_sql(response: &str) -> String {
  let text = response.trim();
  let body = fenced_body(text).unwrap_or(text);

  let mut lines: Vec<&str> = body
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter(|line| !line.starts_with("--") || line.starts_with("-- "))
    .collect();

  while lines.last().is_some_and(|line| is_comment(line)) {
    lines.pop();
  }
  if let Some(last) = lines.last_mut() {
    *last = strip_inline_comment(*last);
  }

  let mut sql = lines.join("\n");
  if !sql.ends_with(';') {
    sql.push(';');
  }
  sql
}

/// `true` if `sql` holds at least one non-comment line with content other than
/// `;`.
pub fn has_statement(sql: &str) -> bool {
  sql.lines().map(str::trim).any(|line| {
    !is_comment(line) && !line.trim_end_matches(';').trim().is_empty()
  })
}

fn is_comment(line: &str) -> bool { line.starts_with("--") }

/// `line` without a `--` comment that starts outside a string literal.
fn strip_inline_comment(line: &str) -> &str {
  let bytes = line.as_bytes();
  let mut in_string = false;
  for (i, &b) in bytes.iter().enumerate() {
    match b {
      b'\'' => in_string = !in_string,
      b'-' if !in_string && bytes.get(i + 1) == Some(&b'-') => return line[..i].trim_end(),
      _ => {}
    }
  }
  line
}

/// Text inside the first fenced block, or `None` when there is no fence.
/// An unterminated fence runs to the end of the text.
fn fenced_body(text: &str) -> Option<&str> {
  let start = text.find("```")?;
  let after = &text[start + 3..];

  let after = match after.split_once('\n') {
    Some((info, rest)) if is_info_string(info) => rest,
    _ => after,
  };

  let end = after.find("```").unwrap_or(after.len());
  Some(&after[..end])
}

/// Language tags models put after an opening fence.
const INFO_STRINGS: [&str; 7] = ["sql", "postgresql", "postgres", "psql", "pgsql", "sqlite", "mysql"];

fn is_info_string(s: &str) -> bool {
  let s = s.trim();
  INFO_STRINGS.iter().any(|tag| tag.eq_ignore_ascii_case(s))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sql_fence_is_unwrapped() {
    let raw = "Here is your query:\n```sql\nSELECT * FROM users\nWHERE age > 30\n```\nHope this helps!";
    assert_eq!(clean_sql(raw), "SELECT * FROM users\nWHERE age > 30;");
  }

  #[test]
  fn bare_fence_is_unwrapped() {
    let raw = "```\nSELECT COUNT(*) FROM orders;\n```";
    assert_eq!(clean_sql(raw), "SELECT COUNT(*) FROM orders;");
  }

  #[test]
  fn other_info_strings_are_dropped() {
    let raw = "```postgresql\nSELECT 1\n```";
    assert_eq!(clean_sql(raw), "SELECT 1;");
  }

  #[test]
  fn statement_on_fence_line_is_kept() {
    assert_eq!(clean_sql("```SELECT\n* FROM users\n```"), "SELECT\n* FROM users;");
    assert_eq!(clean_sql("```SELECT * FROM users```"), "SELECT * FROM users;");
  }

  #[test]
  fn unterminated_fence_runs_to_end() {
    assert_eq!(clean_sql("```sql\nSELECT 1"), "SELECT 1;");
  }

  #[test]
  fn unfenced_response_is_used_verbatim() {
    assert_eq!(clean_sql("  SELECT name FROM users  "), "SELECT name FROM users;");
  }

  #[test]
  fn unspaced_comments_are_discarded() {
    let raw = "--generated\n-- top customers\nSELECT u.name\nFROM users u;";
    assert_eq!(clean_sql(raw), "-- top customers\nSELECT u.name\nFROM users u;");
  }

  #[test]
  fn trailing_comment_does_not_swallow_terminator() {
    let raw = "SELECT 1\n-- returns one row";
    assert_eq!(clean_sql(raw), "SELECT 1;");
  }

  #[test]
  fn inline_comment_does_not_swallow_terminator() {
    assert_eq!(clean_sql("SELECT 1 -- one"), "SELECT 1;");
    assert_eq!(clean_sql("SELECT 1; -- done"), "SELECT 1;");
    assert_eq!(clean_sql("SELECT '--x' AS dashes"), "SELECT '--x' AS dashes;");
    assert_eq!(clean_sql("SELECT 1 --one"), "SELECT 1;");
  }

  #[test]
  fn cleaning_is_idempotent() {
    let inputs = [
      "```sql\nSELECT * FROM users LIMIT 10;\n```",
      "SELECT 1;",
      "-- note\nSELECT 2;   ",
      "\n\n  SELECT a,\n   b FROM t;\n",
      "DROP TABLE IF EXISTS orders;\nDROP TABLE IF EXISTS users;",
    ];
    for input in inputs {
      let once = clean_sql(input);
      assert_eq!(clean_sql(&once), once, "input: {input:?}");
    }
  }

  #[test]
  fn empty_response_has_no_statement() {
    let cleaned = clean_sql("   ");
    assert_eq!(cleaned, ";");
    assert!(!has_statement(&cleaned));
  }

  #[test]
  fn comment_only_response_has_no_statement() {
    assert!(!has_statement(&clean_sql("-- I cannot answer that")));
    assert!(has_statement(&clean_sql("-- answer\nSELECT 1")));
  }
}
