use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of the expression
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Create a span from this location to another
    pub fn span_to(&self, other: &SourceLocation) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.offset,
            length: (other.offset + other.length).saturating_sub(self.offset),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token type enumeration - every token of the mapping expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    New,
    Def,

    // Literals
    Ident,
    Integer,
    /// `""text""`, a literal that was itself quote-escaped by the CSV layer
    DoubleString,
    /// `'text'`
    SingleString,

    // Punctuation
    Dot,          // .
    QuestionDot,  // ?.
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Plus,         // +
    Comma,        // ,
    Colon,        // :
    Question,     // ?
    Quote,        // "
    At,           // @

    // Operators
    And,   // &&
    Or,    // ||
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=

    // Special
    Eof,
}

impl TokenKind {
    /// Get the keyword from a string, if it matches
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "new" => Some(TokenKind::New),
            "def" => Some(TokenKind::Def),
            _ => None,
        }
    }

    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(self, TokenKind::New | TokenKind::Def)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::New => "new",
            TokenKind::Def => "def",
            TokenKind::Ident => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::DoubleString => "double-quoted string",
            TokenKind::SingleString => "single-quoted string",
            TokenKind::Dot => "'.'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Plus => "'+'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Quote => "'\"'",
            TokenKind::At => "'@'",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Eof => "end of expression",
        };
        f.write_str(name)
    }
}

/// A token: its kind, the exact source text, and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eof {
            write!(f, "{} at {}", self.kind, self.location)
        } else {
            write!(f, "{} {:?} at {}", self.kind, self.text, self.location)
        }
    }
}
