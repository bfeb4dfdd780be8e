// Line model: one raw source line in, label/operation/operands out.

use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostics::Kind;

const LABEL: &str = "^[a-zA-Z0-9]+$";
const MAX_LABEL: usize = 6;
const MAX_OPERATION: usize = 5;

/// `Tokens` is a tokenized source line. Absent fields are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tokens {
    /// Label in column one, if any.
    pub label: String,
    /// The operation mnemonic.
    pub operation: String,
    /// Operands in source order. A quoted string is kept verbatim,
    /// quotes included.
    pub operands: Vec<String>,
}

impl Tokens {
    /// `operand` returns the Nth operand or an empty string.
    #[must_use]
    pub fn operand(&self, i: usize) -> &str {
        self.operands.get(i).map_or("", String::as_str)
    }
}

/// `strip_comment` removes everything from the first `;` which isn't inside
/// a quoted string.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

/// `tokenize` splits one source line. `Ok(None)` is a blank or comment only
/// line, `Err` names why the line is malformed.
///
/// # Errors
/// A bad label, an overly long operation or an unterminated string.
pub fn tokenize(line: &str) -> Result<Option<Tokens>, Kind> {
    let code = strip_comment(line).trim_end();
    if code.trim_start().is_empty() {
        return Ok(None);
    }

    // A quoted operand is pulled out whole so embedded spaces and commas
    // survive.
    let (head, quoted, tail) = match code.find('"') {
        Some(start) => match code[start + 1..].find('"') {
            Some(len) => {
                let end = start + len + 2;
                (&code[..start], Some(&code[start..end]), &code[end..])
            }
            None => return Err(Kind::ParserUnterminatedString),
        },
        None => (code, None, ""),
    };

    let mut fields = split(head);
    let label = if code.starts_with(char::is_whitespace) {
        String::new()
    } else {
        fields.next().unwrap_or_default().to_string()
    };
    let mut operation = fields.next().unwrap_or_default().to_string();
    let mut operands: Vec<String> = fields.map(str::to_string).collect();
    if let Some(q) = quoted {
        operands.push(q.to_string());
    }
    operands.extend(split(tail).map(str::to_string));

    if !label.is_empty() {
        check_label(&label)?;
    }
    if operation.len() > MAX_OPERATION {
        return Err(Kind::ParserInvalidOperationLength);
    }

    // ADD and AND take either a third register or an immediate. Pick the
    // immediate form when the last operand isn't a register.
    if (operation == "ADD" || operation == "AND")
        && operands.len() >= 3
        && !operands.last().is_some_and(|o| o.starts_with('R'))
    {
        operation.push('I');
    }

    Ok(Some(Tokens {
        label,
        operation,
        operands,
    }))
}

fn split(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
}

fn check_label(label: &str) -> Result<(), Kind> {
    if label.starts_with(&['R', 'x'][..]) {
        return Err(Kind::ParserLabelInvalidCharacter);
    }
    if label.len() > MAX_LABEL {
        return Err(Kind::ParserInvalidLabelLength);
    }
    if !re().is_match(label) {
        return Err(Kind::ParserNonAlphanumericLabel);
    }
    Ok(())
}

fn re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(LABEL) {
        Ok(re) => re,
        Err(err) => {
            panic!("Error parsing regex {LABEL} - {err}");
        }
    })
}
