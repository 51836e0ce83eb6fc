//! Lexer (tokenizer) for mapping expressions.
//!
//! Converts the text of a value field (or of one leading field) into a stream of
//! [`token::Token`]s for the parser. Characters that match no rule are recorded as
//! [`PseudomapError::IllegalCharacter`] diagnostics and skipped; lexing itself never fails.

pub mod token;

use crate::errors::PseudomapError;
use token::{SourceLocation, Token, TokenKind};

/// Lexer for the mapping expression language
pub struct Lexer<'a> {
    /// Source text being lexed
    source: &'a str,
    /// Characters for iteration
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    /// Current position in bytes
    position: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start position of current token
    token_start: usize,
    /// Start line of current token
    token_start_line: usize,
    /// Start column of current token
    token_start_column: usize,
    /// Illegal characters seen so far
    diagnostics: Vec<PseudomapError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source text
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Illegal-character diagnostics collected so far
    pub fn diagnostics(&self) -> &[PseudomapError] {
        &self.diagnostics
    }

    /// Take collected diagnostics (consumes them)
    pub fn take_diagnostics(&mut self) -> Vec<PseudomapError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token, skipping over anything illegal
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            self.token_start = self.position;
            self.token_start_line = self.line;
            self.token_start_column = self.column;

            let Some(ch) = self.peek_char() else {
                return self.make_token(TokenKind::Eof);
            };

            let kind = match ch {
                'a'..='z' | 'A'..='Z' | '_' => return self.lex_identifier(),
                '0'..='9' => return self.lex_number(),
                '"' => return self.lex_double_string(),
                '\'' => match self.lex_single_string() {
                    Some(token) => return token,
                    None => None,
                },
                '?' => {
                    self.advance();
                    if self.peek_char() == Some('.') {
                        self.advance();
                        Some(TokenKind::QuestionDot)
                    } else {
                        Some(TokenKind::Question)
                    }
                }
                '.' => self.single(TokenKind::Dot),
                '[' => self.single(TokenKind::LeftBracket),
                ']' => self.single(TokenKind::RightBracket),
                '(' => self.single(TokenKind::LeftParen),
                ')' => self.single(TokenKind::RightParen),
                '+' => self.single(TokenKind::Plus),
                ',' => self.single(TokenKind::Comma),
                ':' => self.single(TokenKind::Colon),
                '@' => self.single(TokenKind::At),
                '=' => self.pair('=', TokenKind::EqEq),
                '!' => self.pair('=', TokenKind::NotEq),
                '&' => self.pair('&', TokenKind::And),
                '|' => self.pair('|', TokenKind::Or),
                '<' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Some(TokenKind::LtEq)
                    } else {
                        Some(TokenKind::Lt)
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Some(TokenKind::GtEq)
                    } else {
                        Some(TokenKind::Gt)
                    }
                }
                _ => None,
            };

            match kind {
                Some(kind) => return self.make_token(kind),
                None => self.skip_illegal(),
            }
        }
    }

    /// Peek at the current character without consuming
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Peek at a character at offset from current position
    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.source[self.position..].chars().nth(offset)
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.position = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    /// Advance until the byte position reaches `end`
    fn advance_to(&mut self, end: usize) {
        while self.position < end {
            if self.advance().is_none() {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\n') = self.peek_char() {
            self.advance();
        }
    }

    /// Consume one character and yield `kind`
    fn single(&mut self, kind: TokenKind) -> Option<TokenKind> {
        self.advance();
        Some(kind)
    }

    /// Two-character operator whose first character is illegal on its own
    fn pair(&mut self, second: char, kind: TokenKind) -> Option<TokenKind> {
        if self.peek_char_at(1) == Some(second) {
            self.advance();
            self.advance();
            Some(kind)
        } else {
            None
        }
    }

    /// Report the character at the token start and step over it
    fn skip_illegal(&mut self) {
        let location = self.current_location();
        if let Some(ch) = self.advance() {
            log::warn!("illegal character '{}' at {}", ch, location);
            self.diagnostics.push(PseudomapError::illegal_character(
                self.source,
                &SourceLocation::new(location.line, location.column, location.offset, ch.len_utf8()),
                ch,
            ));
        }
    }

    /// Lex an identifier or keyword
    fn lex_identifier(&mut self) -> Token {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[self.token_start..self.position];
        let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.make_token(kind)
    }

    /// Lex a run of decimal digits
    fn lex_number(&mut self) -> Token {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        self.make_token(TokenKind::Integer)
    }

    /// Lex a `""text""` literal, or a lone quote when no literal starts here
    fn lex_double_string(&mut self) -> Token {
        match double_string_len(&self.source[self.position..]) {
            Some(len) => {
                self.advance_to(self.position + len);
                self.make_token(TokenKind::DoubleString)
            }
            None => {
                self.advance();
                self.make_token(TokenKind::Quote)
            }
        }
    }

    /// Lex a `'text'` literal; `None` when the quote is never closed
    fn lex_single_string(&mut self) -> Option<Token> {
        let rest = &self.source[self.position + 1..];
        let close = rest.find('\'')?;
        self.advance_to(self.position + close + 2);
        Some(self.make_token(TokenKind::SingleString))
    }

    /// Create a token with the current token span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            &self.source[self.token_start..self.position],
            self.token_location(),
        )
    }

    /// Get the location for the current token
    fn token_location(&self) -> SourceLocation {
        SourceLocation::new(
            self.token_start_line,
            self.token_start_column,
            self.token_start,
            self.position - self.token_start,
        )
    }

    /// Get the current location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.position, 1)
    }
}

/// Byte length of a doubled-quote literal at the start of `rest`.
///
/// The literal is `""`, a run of non-quote characters, then `""`. The run may be empty,
/// one character other than a comma, or two or more characters; `"",""` is two empty
/// quoted CSV fields rather than a literal.
fn double_string_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix("\"\"")?;
    let close = body.find('"')?;
    if !body[close..].starts_with("\"\"") {
        return None;
    }
    if &body[..close] == "," {
        return None;
    }
    Some(2 + close + 2)
}
