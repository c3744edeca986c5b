use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};
use crate::token::{is_ident_continue, is_ident_start, Keyword, Token, SYMBOLS};

/// Scans a lazy sequence of source lines into a stream of tokens.
///
/// Maintains exactly the state spec.md describes: the current line's byte
/// cursor, the current line number, and `in_block_comment` — whether a
/// `/* ... */` comment opened on an earlier line is still unclosed.
pub struct Tokenizer<I> {
    lines: I,
    buf: String,
    pos: usize,
    line_num: u32,
    next_line_num: u32,
    in_block_comment: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<I: Iterator<Item = String>> Tokenizer<I> {
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            buf: String::new(),
            pos: 0,
            line_num: 0,
            next_line_num: 0,
            in_block_comment: false,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the whole input, returning every token (including a
    /// trailing `Eof`) plus any diagnostics accumulated along the way.
    pub fn tokenize(mut self) -> (Vec<Spanned<Token>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn advance_line(&mut self) -> bool {
        match self.lines.next() {
            Some(line) => {
                self.buf = line.strip_suffix('\r').map(str::to_string).unwrap_or(line);
                self.pos = 0;
                self.line_num = self.next_line_num;
                self.next_line_num += 1;
                true
            }
            None => false,
        }
    }

    fn make(&self, token: Token) -> Spanned<Token> {
        Spanned::new(token, Span::new(self.line_num))
    }

    fn rest(&self) -> &[u8] {
        self.buf.as_bytes()[self.pos..].as_ref()
    }

    fn next_token(&mut self) -> Spanned<Token> {
        loop {
            if self.pos >= self.buf.len() {
                if !self.advance_line() {
                    return self.make(Token::Eof);
                }
                continue;
            }

            if self.in_block_comment {
                if let Some(idx) = find(self.rest(), b"*/") {
                    self.pos += idx + 2;
                    self.in_block_comment = false;
                } else {
                    self.pos = self.buf.len();
                }
                continue;
            }

            let ch = self.buf.as_bytes()[self.pos];
            if (ch as char).is_whitespace() {
                self.pos += 1;
                continue;
            }

            if self.rest().starts_with(b"//") {
                self.pos = self.buf.len();
                continue;
            }
            if self.rest().starts_with(b"/*") {
                self.pos += 2;
                if let Some(idx) = find(self.rest(), b"*/") {
                    self.pos += idx + 2;
                } else {
                    self.in_block_comment = true;
                    self.pos = self.buf.len();
                }
                continue;
            }

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }
            if ch.is_ascii_digit() {
                return self.scan_number();
            }
            if ch == b'"' {
                return self.scan_string();
            }
            if SYMBOLS.contains(&(ch as char)) {
                self.pos += 1;
                return self.make(Token::Symbol(ch as char));
            }

            self.diagnostics.push(Diagnostic::error(
                format!("unrecognized character '{}'", ch as char),
                Span::new(self.line_num),
            ));
            self.pos += 1;
        }
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Token> {
        let start = self.pos;
        while self.pos < self.buf.len() && is_ident_continue(self.buf.as_bytes()[self.pos]) {
            self.pos += 1;
        }
        let text = &self.buf[start..self.pos];
        let token = match Keyword::from_str(text) {
            Some(kw) => Token::Keyword(kw),
            None => Token::Identifier(text.to_string()),
        };
        self.make(token)
    }

    fn scan_number(&mut self) -> Spanned<Token> {
        let start = self.pos;
        while self.pos < self.buf.len() && self.buf.as_bytes()[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let text = &self.buf[start..self.pos];
        let value: u32 = text.parse().unwrap_or(u32::MAX);
        if value > 32767 {
            self.diagnostics.push(Diagnostic::error(
                format!("integer constant out of range: {} (max 32767)", text),
                Span::new(self.line_num),
            ));
        }
        self.make(Token::IntegerConstant(value.min(32767) as u16))
    }

    /// Broadened per spec.md §9 Open Question 2: any printable ASCII
    /// except `"` and newline (strings cannot span lines).
    fn scan_string(&mut self) -> Spanned<Token> {
        self.pos += 1; // opening quote
        let start = self.pos;
        while self.pos < self.buf.len() && self.buf.as_bytes()[self.pos] != b'"' {
            self.pos += 1;
        }
        if self.pos >= self.buf.len() {
            self.diagnostics.push(Diagnostic::error(
                "unterminated string constant".to_string(),
                Span::new(self.line_num),
            ));
            let text = self.buf[start..self.pos].to_string();
            return self.make(Token::StringConstant(text));
        }
        let text = self.buf[start..self.pos].to_string();
        self.pos += 1; // closing quote
        self.make(Token::StringConstant(text))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let lines = src.lines().map(str::to_string);
        let (tokens, diags) = Tokenizer::new(lines).tokenize();
        (tokens.into_iter().map(|t| t.node).collect(), diags)
    }

    #[test]
    fn keywords_and_symbols() {
        let (toks, diags) = tokenize("class Main {\n}\n");
        assert!(diags.is_empty());
        assert_eq!(
            toks,
            vec![
                Token::Keyword(Keyword::Class),
                Token::Identifier("Main".to_string()),
                Token::Symbol('{'),
                Token::Symbol('}'),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_elided() {
        let (toks, _) = tokenize("let x = 1; // comment\nlet y = 2;\n");
        assert_eq!(toks.iter().filter(|t| **t == Token::Eof).count(), 1);
        assert!(!toks.iter().any(|t| matches!(t, Token::Identifier(s) if s == "comment")));
    }

    #[test]
    fn block_comment_spans_lines() {
        let (toks, diags) = tokenize("let x = 1; /* block\nstill a comment\nend */ let y = 2;\n");
        assert!(diags.is_empty());
        let idents: Vec<_> = toks
            .iter()
            .filter_map(|t| match t {
                Token::Identifier(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["x", "y"]);
    }

    #[test]
    fn line_numbers_are_monotonic() {
        let lines = "let x = 1;\n\nlet y = 2;\n"
            .lines()
            .map(str::to_string);
        let (tokens, _) = Tokenizer::new(lines).tokenize();
        let mut last = 0u32;
        for t in &tokens {
            assert!(t.span.line >= last);
            last = t.span.line;
        }
        // "y" is on line 2 (zero-based)
        let y = tokens
            .iter()
            .find(|t| matches!(&t.node, Token::Identifier(s) if s == "y"))
            .unwrap();
        assert_eq!(y.span.line, 2);
    }

    #[test]
    fn string_constant() {
        let (toks, diags) = tokenize("do Output.printString(\"Hello, World!\");\n");
        assert!(diags.is_empty());
        assert!(toks
            .iter()
            .any(|t| matches!(t, Token::StringConstant(s) if s == "Hello, World!")));
    }

    #[test]
    fn integer_out_of_range_reports_diagnostic() {
        let (_, diags) = tokenize("let x = 99999;\n");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn unrecognized_character_reports_diagnostic_and_continues() {
        let (toks, diags) = tokenize("let x @ = 1;\n");
        assert_eq!(diags.len(), 1);
        assert!(toks.iter().any(|t| *t == Token::IntegerConstant(1)));
    }
}
