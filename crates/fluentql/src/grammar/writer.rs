//! Placeholder-aware SQL text writer.
//!
//! SQL pieces and placeholders are stored separately and numbered only in
//! [`SqlWriter::finish`], so nested sub-selects written into the same writer keep a
//! single, continuous numbering.

use crate::grammar::PlaceholderStyle;
use crate::param::Param;

/// Number of `?` markers in a raw fragment, not counting `??` escapes.
pub(crate) fn count_markers(sql: &str) -> usize {
    let mut count = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '?' {
            continue;
        }
        if chars.peek() == Some(&'?') {
            chars.next();
        } else {
            count += 1;
        }
    }
    count
}

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Placeholder,
}

#[derive(Debug)]
pub struct SqlWriter {
    parts: Vec<SqlPart>,
    style: PlaceholderStyle,
    placeholders: usize,
}

impl SqlWriter {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            parts: Vec::new(),
            style,
            placeholders: 0,
        }
    }

    /// Append raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    pub fn push_placeholder(&mut self) -> &mut Self {
        self.parts.push(SqlPart::Placeholder);
        self.placeholders += 1;
        self
    }

    /// Write an argument: one placeholder per bound leaf, expressions verbatim.
    pub fn push_param(&mut self, param: &Param) -> &mut Self {
        match param {
            Param::Expr(expr) => self.push(expr.as_str()),
            Param::Value(value) => {
                for i in 0..value.leaf_count() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push_placeholder();
                }
                self
            }
        }
    }

    /// Write a comma-separated argument list.
    pub fn push_params(&mut self, params: &[Param]) -> &mut Self {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_param(param);
        }
        self
    }

    /// Write raw SQL, turning its first `binding_count` `?` markers into
    /// placeholders. `??` is written as a literal `?`.
    pub fn push_template(&mut self, sql: &str, binding_count: usize) -> &mut Self {
        let mut remaining = binding_count;
        let mut rest = sql;
        while let Some(pos) = rest.find('?') {
            self.push(&rest[..pos]);
            let after = &rest[pos + 1..];
            if let Some(tail) = after.strip_prefix('?') {
                self.push("?");
                rest = tail;
            } else if remaining > 0 {
                self.push_placeholder();
                remaining -= 1;
                rest = after;
            } else {
                self.push("?");
                rest = after;
            }
        }
        self.push(rest)
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Render the SQL, numbering `$n` placeholders when the style asks for it.
    pub fn finish(self) -> String {
        let mut out = String::new();
        let mut n = 0usize;
        for part in self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(&s),
                SqlPart::Placeholder => {
                    n += 1;
                    match self.style {
                        PlaceholderStyle::Numbered => {
                            out.push('$');
                            out.push_str(&n.to_string());
                        }
                        PlaceholderStyle::QuestionMark => out.push('?'),
                    }
                }
            }
        }
        out
    }
}
