//! Message templates with `{name}` placeholders.
//!
//! `{{` and `}}` render literal braces. A placeholder with no value is an
//! error; callers decide whether to fall back to the raw template.

use crate::error::{DeskError, DeskResult};

pub fn render(template: &str, vars: &[(&str, &str)]) -> DeskResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    // Unterminated brace: keep it verbatim.
                    out.push('{');
                    out.push_str(&name);
                    continue;
                }
                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name.trim())
                    .map(|(_, v)| *v)
                    .ok_or_else(|| DeskError::Template { placeholder: name.clone() })?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Render, or log and return the template untouched.
pub fn render_or_raw(template: &str, vars: &[(&str, &str)], what: &str) -> String {
    match render(template, vars) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("{what}: {e}; sending template unformatted");
            template.to_string()
        }
    }
}
