//! Tokenizer for C# source text.
//!
//! Only what the structural scan needs survives: identifiers and keywords,
//! single-character punctuation, and `///` documentation lines. Literals are
//! consumed as opaque tokens and ordinary comments are dropped.

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword; a leading `@` is removed
    Ident,
    /// String, character or numeric literal
    Literal,
    /// Any other single character
    Punct(char),
    /// One `///` line, without the slashes
    DocComment,
}

/// A token with its text and 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: u32,
}

impl Token<'_> {
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

/// The lexer.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    keep_docs: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer. `keep_docs` controls whether `///` lines are emitted.
    pub fn new(source: &'a str, keep_docs: bool) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            keep_docs,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn advance_while(&mut self, keep: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !keep(ch) {
                break;
            }
            self.advance();
        }
    }

    fn token(&self, kind: TokenKind, start: usize, line: u32) -> Token<'a> {
        Token {
            kind,
            text: &self.source[start..self.pos],
            line,
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            self.advance_while(char::is_whitespace);
            let rest = self.rest();

            if rest.starts_with("///") && !rest.starts_with("////") {
                let line = self.line;
                self.pos += 3;
                let start = self.pos;
                self.advance_while(|c| c != '\n');
                if self.keep_docs {
                    let text = self.source[start..self.pos].trim_end_matches('\r');
                    let text = text.strip_prefix(' ').unwrap_or(text);
                    return Some(Token {
                        kind: TokenKind::DocComment,
                        text,
                        line,
                    });
                }
            } else if rest.starts_with("//") {
                self.advance_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                self.pos += 2;
                while !self.rest().is_empty() && !self.rest().starts_with("*/") {
                    self.advance();
                }
                self.pos = (self.pos + 2).min(self.source.len());
            } else {
                break;
            }
        }

        let start = self.pos;
        let line = self.line;
        let ch = self.peek()?;

        if let Some((len, dollars, verbatim)) = self.string_prefix() {
            self.pos += len;
            self.string(dollars, verbatim);
            return Some(self.token(TokenKind::Literal, start, line));
        }

        let kind = match ch {
            '\'' => {
                self.char_literal();
                TokenKind::Literal
            }
            '@' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.advance();
                let start = self.pos;
                self.advance_while(is_ident_continue);
                return Some(self.token(TokenKind::Ident, start, line));
            }
            c if c.is_ascii_digit() => {
                self.advance_while(|c| c.is_alphanumeric() || c == '_');
                if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    self.advance_while(|c| c.is_alphanumeric() || c == '_');
                }
                TokenKind::Literal
            }
            c if is_ident_start(c) => {
                self.advance_while(is_ident_continue);
                TokenKind::Ident
            }
            c => {
                self.advance();
                TokenKind::Punct(c)
            }
        };

        Some(self.token(kind, start, line))
    }

    /// Recognize the start of a string literal, including `$"`, `@"`, `$@"`,
    /// `@$"` and `$$"""`. Returns (prefix length, number of `$`, verbatim).
    fn string_prefix(&self) -> Option<(usize, usize, bool)> {
        let rest = self.rest();
        let len = rest.find(|c| c != '$' && c != '@')?;
        if !rest[len..].starts_with('"') {
            return None;
        }
        let prefix = &rest[..len];
        let verbatim = prefix.matches('@').count();
        if verbatim > 1 {
            return None;
        }
        Some((len, len - verbatim, verbatim == 1))
    }

    /// Consume a string literal starting at its opening quote.
    fn string(&mut self, dollars: usize, verbatim: bool) {
        let quotes = self.rest().chars().take_while(|&c| c == '"').count();
        if quotes >= 3 {
            self.raw_string(quotes);
            return;
        }

        self.advance();
        let interpolated = dollars > 0;
        while let Some(ch) = self.advance() {
            match ch {
                '\\' if !verbatim => {
                    self.advance();
                }
                '"' if verbatim && self.peek() == Some('"') => {
                    self.advance();
                }
                '"' => return,
                '\n' if !verbatim => return,
                '{' if interpolated => {
                    if self.peek() == Some('{') {
                        self.advance();
                    } else {
                        self.interpolation_hole();
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip `{ ... }` inside an interpolated string, including nested literals.
    fn interpolation_hole(&mut self) {
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            if let Some((len, dollars, verbatim)) = self.string_prefix() {
                self.pos += len;
                self.string(dollars, verbatim);
                continue;
            }
            match ch {
                '\'' => {
                    self.char_literal();
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn raw_string(&mut self, quotes: usize) {
        self.pos += quotes;
        let delimiter = "\"".repeat(quotes);
        while !self.rest().is_empty() {
            if self.rest().starts_with(&delimiter) {
                self.pos += quotes;
                self.advance_while(|c| c == '"');
                return;
            }
            self.advance();
        }
    }

    fn char_literal(&mut self) {
        self.advance();
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    self.advance();
                }
                '\'' | '\n' => return,
                _ => {}
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idents(source: &str) -> Vec<&str> {
        Lexer::new(source, true)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_comments_are_dropped() {
        let src = "a // class B\n/* class C */ d //// e\n";
        assert_eq!(idents(src), ["a", "d"]);
    }

    #[test]
    fn test_doc_comments_are_kept() {
        let tokens = Lexer::new("/// <summary>Hi</summary>\nclass A {}", true).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::DocComment);
        assert_eq!(tokens[0].text, "<summary>Hi</summary>");
        assert_eq!(tokens[1].line, 2);

        let tokens = Lexer::new("/// doc\nclass A {}", false).tokenize();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::DocComment));
    }

    #[test]
    fn test_string_literals_hide_keywords() {
        let src = r#"x = "class A {"; y = @"c:\ ""class"" "; z = 'c';"#;
        assert_eq!(idents(src), ["x", "y", "z"]);
    }

    #[test]
    fn test_interpolated_strings() {
        let src = r#"a = $"{b} {{class}} {c + "}"}"; d"#;
        assert_eq!(idents(src), ["a", "d"]);
    }

    #[test]
    fn test_raw_string() {
        let src = "a = \"\"\"\n class \"quoted\" \n\"\"\"; b";
        assert_eq!(idents(src), ["a", "b"]);
    }

    #[test]
    fn test_verbatim_identifier() {
        assert_eq!(idents("var @class = 1;"), ["var", "class"]);
    }

    #[test]
    fn test_lines() {
        let tokens = Lexer::new("a\n\"x\ny\"\nb", true).tokenize();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        // A regular string stops at the newline.
        assert_eq!(b.line, 4);
    }
}
