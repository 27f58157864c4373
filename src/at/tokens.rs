// ABOUTME: Splits an AT information line into its comma separated fields
// ABOUTME: Strips the +TAG: prefix, respects quotes and parentheses, and unquotes fields

use std::str::FromStr;

/// Ordered fields of one AT line.
///
/// Quoted fields are returned without their quotes; parenthesised groups
/// such as `(1,2,3)` stay a single field, parentheses included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tokens<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Tokens<'a> {
    pub fn new(line: &'a str) -> Self {
        let body = strip_tag(line.trim());
        if body.is_empty() {
            return Self { fields: Vec::new() };
        }

        let mut fields = Vec::new();
        let mut in_quotes = false;
        let mut depth = 0usize;
        let mut start = 0;

        for (i, c) in body.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                '(' if !in_quotes => depth += 1,
                ')' if !in_quotes => depth = depth.saturating_sub(1),
                ',' if !in_quotes && depth == 0 => {
                    fields.push(unquote(&body[start..i]));
                    start = i + 1;
                }
                _ => {}
            }
        }
        fields.push(unquote(&body[start..]));

        Self { fields }
    }

    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.fields.get(i).copied()
    }

    /// Parses field `i`; missing or malformed fields yield `None`
    pub fn parse<T: FromStr>(&self, i: usize) -> Option<T> {
        self.get(i)?.parse().ok()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.fields.iter().copied()
    }
}

/// Tag of an unsolicited or information line, e.g. `+CMTI` for
/// `+CMTI: "SM",3`. Lines without a tag return `None`.
pub fn line_tag(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if !line.starts_with('+') {
        return None;
    }
    let end = line.find(':')?;
    let tag = &line[..end];
    tag.chars()
        .skip(1)
        .all(|c| c.is_ascii_alphanumeric())
        .then_some(tag)
}

fn strip_tag(line: &str) -> &str {
    match line_tag(line) {
        Some(tag) => line[tag.len() + 1..].trim_start(),
        None => line,
    }
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}
