//! `{name}` placeholder substitution for notification and response templates.

use std::collections::BTreeMap;

/// Replace `{name}` placeholders with values from `vars`.
///
/// Unknown placeholders are kept as written. `{{` and `}}` produce literal braces.
pub fn fill(template: &str, vars: &BTreeMap<&str, String>) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
    out.push_str(&rest[..pos]);
    let tail = &rest[pos..];

    if tail.starts_with("{{") {
      out.push('{');
      rest = &tail[2..];
      continue;
    }
    if tail.starts_with("}}") {
      out.push('}');
      rest = &tail[2..];
      continue;
    }
    if tail.starts_with('}') {
      out.push('}');
      rest = &tail[1..];
      continue;
    }

    // tail starts with a single '{'
    match tail[1..].find('}') {
      Some(end) => {
        let name = &tail[1..=end];
        match vars.get(name.trim()) {
          Some(value) => out.push_str(value),
          None => out.push_str(&tail[..end + 2]),
        }
        rest = &tail[end + 2..];
      }
      None => {
        out.push_str(tail);
        rest = "";
      }
    }
  }

  out.push_str(rest);
  out
}
