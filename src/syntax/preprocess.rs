//! Conditional compilation directives.
//!
//! Directive lines and lines inside inactive `#if` branches are blanked
//! rather than removed so that line numbers of the remaining text are
//! unchanged.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*([A-Za-z]+)\b(.*)$").expect("directive pattern is valid")
});

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Whether the enclosing region is active
    parent_active: bool,
    /// Whether some branch of this `#if` was already taken
    taken: bool,
    active: bool,
}

/// Evaluate the conditional directives of `text` against `symbols`.
///
/// `#define` and `#undef` in active regions update the symbol set for the
/// rest of the file. Unknown directives (`#region`, `#pragma`, `#nullable`,
/// ...) are blanked and otherwise ignored.
pub fn preprocess(text: &str, symbols: &BTreeSet<String>) -> String {
    let mut symbols = symbols.clone();
    let mut frames: Vec<Frame> = Vec::new();
    let mut out = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let active = frames.last().map_or(true, |f| f.active);
        let newline = if line.ends_with("\r\n") {
            "\r\n"
        } else if line.ends_with('\n') {
            "\n"
        } else {
            ""
        };

        let Some(caps) = DIRECTIVE.captures(line.trim_end()) else {
            if active {
                out.push_str(line);
            } else {
                out.push_str(newline);
            }
            continue;
        };

        let directive = caps.get(1).map_or("", |m| m.as_str());
        let argument = strip_comment(caps.get(2).map_or("", |m| m.as_str()));

        match directive {
            "if" => {
                let value = active && evaluate(argument, &symbols);
                frames.push(Frame {
                    parent_active: active,
                    taken: value,
                    active: value,
                });
            }
            "elif" => match frames.last_mut() {
                Some(frame) => {
                    let value =
                        frame.parent_active && !frame.taken && evaluate(argument, &symbols);
                    frame.active = value;
                    frame.taken |= value;
                }
                None => tracing::debug!("#elif without #if"),
            },
            "else" => match frames.last_mut() {
                Some(frame) => {
                    frame.active = frame.parent_active && !frame.taken;
                    frame.taken = true;
                }
                None => tracing::debug!("#else without #if"),
            },
            "endif" => {
                if frames.pop().is_none() {
                    tracing::debug!("#endif without #if");
                }
            }
            "define" if active => {
                symbols.insert(argument.to_string());
            }
            "undef" if active => {
                symbols.remove(argument);
            }
            _ => {}
        }

        out.push_str(newline);
    }

    if !frames.is_empty() {
        tracing::debug!("{} unterminated #if block(s)", frames.len());
    }

    out
}

fn strip_comment(argument: &str) -> &str {
    match argument.find("//") {
        Some(idx) => argument[..idx].trim(),
        None => argument.trim(),
    }
}

/// Evaluate a directive condition. A malformed condition is false.
pub fn evaluate(expr: &str, symbols: &BTreeSet<String>) -> bool {
    let tokens = match tokenize(expr) {
        Some(tokens) => tokens,
        None => {
            tracing::debug!("malformed condition `{}`", expr);
            return false;
        }
    };

    let mut parser = ConditionParser {
        tokens: &tokens,
        pos: 0,
        symbols,
    };
    match parser.or() {
        Some(value) if parser.pos == tokens.len() => value,
        _ => {
            tracing::debug!("malformed condition `{}`", expr);
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CondToken {
    Symbol(String),
    Not,
    And,
    Or,
    Eq,
    NotEq,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<CondToken>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '(' => CondToken::Open,
            ')' => CondToken::Close,
            '!' if chars.next_if(|&(_, c)| c == '=').is_some() => CondToken::NotEq,
            '!' => CondToken::Not,
            '=' => {
                chars.next_if(|&(_, c)| c == '=')?;
                CondToken::Eq
            }
            '&' => {
                chars.next_if(|&(_, c)| c == '&')?;
                CondToken::And
            }
            '|' => {
                chars.next_if(|&(_, c)| c == '|')?;
                CondToken::Or
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((idx, c)) = chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_')
                {
                    end = idx + c.len_utf8();
                }
                CondToken::Symbol(expr[start..end].to_string())
            }
            _ => return None,
        };
        tokens.push(token);
    }

    Some(tokens)
}

/// Precedence, lowest first: `||`, `&&`, `== !=`, `!`.
struct ConditionParser<'a> {
    tokens: &'a [CondToken],
    pos: usize,
    symbols: &'a BTreeSet<String>,
}

impl ConditionParser<'_> {
    fn peek(&self) -> Option<&CondToken> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &CondToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<bool> {
        let mut value = self.and()?;
        while self.eat(&CondToken::Or) {
            let rhs = self.and()?;
            value = value || rhs;
        }
        Some(value)
    }

    fn and(&mut self) -> Option<bool> {
        let mut value = self.equality()?;
        while self.eat(&CondToken::And) {
            let rhs = self.equality()?;
            value = value && rhs;
        }
        Some(value)
    }

    fn equality(&mut self) -> Option<bool> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&CondToken::Eq) {
                value = value == self.unary()?;
            } else if self.eat(&CondToken::NotEq) {
                value = value != self.unary()?;
            } else {
                return Some(value);
            }
        }
    }

    fn unary(&mut self) -> Option<bool> {
        if self.eat(&CondToken::Not) {
            return Some(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<bool> {
        match self.tokens.get(self.pos)? {
            CondToken::Open => {
                self.pos += 1;
                let value = self.or()?;
                self.eat(&CondToken::Close).then_some(value)
            }
            CondToken::Symbol(name) => {
                self.pos += 1;
                Some(match name.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => self.symbols.contains(name),
                })
            }
            _ => None,
        }
    }
}
