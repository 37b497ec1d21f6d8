use std::fs;
use std::path::Path;

use tracing::debug;

use lookml_core::{FieldKind, LookmlError, Result};

const INDENT: &str = "  ";

/// In-memory line buffer for one LookML file. Patches are applied against
/// the original parse's field metadata; the buffer is never re-parsed
/// mid-operation.
pub struct FileModifier {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl FileModifier {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        Ok(Self::from_source(&source))
    }

    pub fn from_source(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            trailing_newline: source.ends_with('\n'),
        }
    }

    /// Insert or replace the description of `kind name`.
    ///
    /// `existing_line_count` is the line count of the current description as
    /// reported by the parse pass; it is trusted when replacing, with a
    /// structural-mismatch error as the safety net when the raw text and the
    /// parse tree disagree.
    pub fn modify(
        &mut self,
        existing_line_count: usize,
        kind: FieldKind,
        name: &str,
        desired: &str,
        has_existing: bool,
    ) -> Result<()> {
        let header = self
            .lines
            .iter()
            .position(|line| is_field_header(line, kind, name))
            .ok_or_else(|| {
                LookmlError::StructuralMismatch(format!(
                    "could not locate block for {} {} in raw text",
                    kind, name
                ))
            })?;

        // a block that opens and closes on its own line has no interior
        // lines to splice; rewrite it to multi-line form first
        if brace_delta(&self.lines[header]) == 0 {
            self.expand_inline_block(header);
        }

        if has_existing {
            self.replace_description(header, existing_line_count, kind, name, desired)
        } else {
            self.insert_description(header, desired);
            Ok(())
        }
    }

    fn insert_description(&mut self, header: usize, desired: &str) {
        let indent = format!("{}{}", leading_whitespace(&self.lines[header]), INDENT);
        let rendered = render_description(&indent, desired);
        debug!("Injecting {}-line description after line {}", rendered.len(), header + 1);
        self.lines.splice(header + 1..header + 1, rendered);
    }

    fn replace_description(
        &mut self,
        header: usize,
        existing_line_count: usize,
        kind: FieldKind,
        name: &str,
        desired: &str,
    ) -> Result<()> {
        let start = self.find_description_line(header).ok_or_else(|| {
            LookmlError::StructuralMismatch(format!(
                "parse reported a description for {} {} but none was found in raw text",
                kind, name
            ))
        })?;
        let end = start + existing_line_count;
        if end > self.lines.len() {
            return Err(LookmlError::StructuralMismatch(format!(
                "description of {} {} reported as {} lines but the file ends early",
                kind, name, existing_line_count
            )));
        }
        let indent = leading_whitespace(&self.lines[start]).to_string();
        let rendered = render_description(&indent, desired);
        debug!(
            "Replacing lines {}..{} with {}-line description",
            start + 1,
            end,
            rendered.len()
        );
        self.lines.splice(start..end, rendered);
        Ok(())
    }

    /// Rewrite a `kind: name { ... }` block that fits on one line into
    /// multi-line form, so the splice paths apply uniformly. An inline
    /// description pair lands on a line of its own; the rest of the body
    /// stays together.
    fn expand_inline_block(&mut self, header: usize) {
        let line = self.lines[header].clone();
        let (Some(open), Some(close)) = (line.find('{'), line.rfind('}')) else {
            return;
        };
        let indent = leading_whitespace(&line).to_string();
        let body_indent = format!("{}{}", indent, INDENT);
        let inner = line[open + 1..close].trim();
        debug!("Expanding one-line block at line {}", header + 1);

        let mut expanded = vec![line[..=open].to_string()];
        match inline_description_span(inner) {
            Some((start, end)) => {
                let before = inner[..start].trim();
                let after = inner[end..].trim();
                if !before.is_empty() {
                    expanded.push(format!("{}{}", body_indent, before));
                }
                expanded.push(format!("{}{}", body_indent, &inner[start..end]));
                if !after.is_empty() {
                    expanded.push(format!("{}{}", body_indent, after));
                }
            }
            None => {
                if !inner.is_empty() {
                    expanded.push(format!("{}{}", body_indent, inner));
                }
            }
        }
        expanded.push(format!("{}}}{}", indent, line[close + 1..].trim_end()));
        self.lines.splice(header..header + 1, expanded);
    }

    /// First `description:` line inside the field block opened at `header`,
    /// tracked by brace depth so sibling fields are never touched.
    fn find_description_line(&self, header: usize) -> Option<usize> {
        let mut depth = brace_delta(&self.lines[header]);
        for (offset, line) in self.lines[header + 1..].iter().enumerate() {
            if depth <= 0 {
                return None;
            }
            if depth == 1 && is_description_line(line) {
                return Some(header + 1 + offset);
            }
            depth += brace_delta(line);
        }
        None
    }

    pub fn source(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.source())?;
        Ok(())
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn is_field_header(line: &str, kind: FieldKind, name: &str) -> bool {
    let rest = line.trim_start();
    let Some(rest) = rest.strip_prefix(kind.as_str()) else {
        return false;
    };
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix(':') else {
        return false;
    };
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix(name) else {
        return false;
    };
    rest.trim_start().starts_with('{')
}

fn is_description_line(line: &str) -> bool {
    let rest = line.trim_start();
    match rest.strip_prefix("description") {
        Some(rest) => rest.trim_start().starts_with(':'),
        None => false,
    }
}

/// Net brace depth change of one line. Braces inside quoted strings or
/// `${...}` references are balanced within the line, so a plain count holds.
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    for c in line.chars() {
        match c {
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// Byte span of a `description: "..."` pair within a single line of block
/// body, honoring `\"` escapes inside the quoted value.
fn inline_description_span(text: &str) -> Option<(usize, usize)> {
    const KEY: &str = "description";
    let mut from = 0;
    while let Some(found) = text[from..].find(KEY) {
        let start = from + found;
        let token_boundary = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
        let after_key = text[start + KEY.len()..].trim_start();
        if token_boundary && after_key.starts_with(':') {
            let value = after_key[1..].trim_start();
            let value_start = text.len() - value.len();
            let quoted = value.strip_prefix('"')?;
            let mut escaped = false;
            for (i, c) in quoted.char_indices() {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    return Some((start, value_start + 1 + i + 1));
                }
            }
            return None;
        }
        from = start + KEY.len();
    }
    None
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Single-line text renders as the inline quoted form; multi-line text
/// renders as the block form, one quoted string spanning the input's lines.
fn render_description(indent: &str, text: &str) -> Vec<String> {
    let escaped = escape(text);
    if !escaped.contains('\n') {
        return vec![format!("{}description: \"{}\"", indent, escaped)];
    }
    let parts: Vec<&str> = escaped.split('\n').collect();
    let mut rendered = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            rendered.push(format!("{}description: \"{}", indent, part));
        } else if i == parts.len() - 1 {
            rendered.push(format!("{}\"", part));
        } else {
            rendered.push(part.to_string());
        }
    }
    rendered
}
