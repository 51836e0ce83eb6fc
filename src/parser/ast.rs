//! Abstract Syntax Tree (AST) definitions for mapping expressions and rows
//!
//! The parser renders pseudocode while it reduces, so every reduction yields a
//! [`Fragment`]: the structured node together with its rendered text.

use std::fmt;

use crate::lexer::token::TokenKind;

/// What a literal was written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Identifier,
    Number,
    String,
}

/// Comparison operators: `< <= > >= == !=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
}

impl ComparisonOp {
    pub fn from_token(kind: TokenKind) -> Option<ComparisonOp> {
        match kind {
            TokenKind::Lt => Some(ComparisonOp::Lt),
            TokenKind::LtEq => Some(ComparisonOp::LtEq),
            TokenKind::Gt => Some(ComparisonOp::Gt),
            TokenKind::GtEq => Some(ComparisonOp::GtEq),
            TokenKind::EqEq => Some(ComparisonOp::Eq),
            TokenKind::NotEq => Some(ComparisonOp::NotEq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Eq => "==",
            ComparisonOp::NotEq => "!=",
        }
    }
}

/// Boolean connectors. `&&` and `||` share one precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn from_token(kind: TokenKind) -> Option<Connector> {
        match kind {
            TokenKind::And => Some(Connector::And),
            TokenKind::Or => Some(Connector::Or),
            _ => None,
        }
    }

    /// The word a connector renders as
    pub fn as_word(&self) -> &'static str {
        match self {
            Connector::And => "and",
            Connector::Or => "or",
        }
    }
}

/// Which branch of a conditional, if any, is itself a conditional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryShape {
    Flat,
    ThenNested,
    ElseNested,
}

impl TernaryShape {
    /// `None` when both branches are nested, which no single reduction allows
    pub fn of(then_branch: &Expr, else_branch: &Expr) -> Option<TernaryShape> {
        match (then_branch.is_conditional(), else_branch.is_conditional()) {
            (false, false) => Some(TernaryShape::Flat),
            (true, false) => Some(TernaryShape::ThenNested),
            (false, true) => Some(TernaryShape::ElseNested),
            (true, true) => None,
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier, number, or string payload as written
    Literal { kind: LiteralKind, text: String },
    /// `base.field` or `base?.field`
    PathAccess {
        base: Box<Expr>,
        field: Box<Expr>,
        null_safe: bool,
    },
    /// `left + right`
    Concat { left: Box<Expr>, right: Box<Expr> },
    /// `base[key]`
    Index { base: Box<Expr>, key: Box<Expr> },
    /// `name(args...)`
    Call { name: String, args: Vec<Expr> },
    /// `new name(args...)`
    New(Box<Expr>),
    /// `left op right`
    Comparison {
        left: Box<Expr>,
        op: ComparisonOp,
        right: Box<Expr>,
    },
    /// Flat left-associative chain; `connectors.len() == terms.len() - 1`
    BoolChain {
        terms: Vec<Expr>,
        connectors: Vec<Connector>,
    },
    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// An omitted sub-expression
    Blank,
}

impl Expr {
    pub fn identifier(text: impl Into<String>) -> Expr {
        Expr::Literal {
            kind: LiteralKind::Identifier,
            text: text.into(),
        }
    }

    /// True for a conditional, including one with terms appended to it
    pub fn is_conditional(&self) -> bool {
        match self {
            Expr::Ternary { .. } => true,
            Expr::Concat { left, .. } => left.is_conditional(),
            _ => false,
        }
    }
}

/// A reduced expression: the node and its rendered pseudocode
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub expr: Expr,
    pub text: String,
}

impl Fragment {
    pub fn new(expr: Expr, text: impl Into<String>) -> Self {
        Self {
            expr,
            text: text.into(),
        }
    }
}

/// The bracketed part of a path element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// `name[3]`
    Position(String),
    /// `name[key]`
    Name(String),
    /// `name[segment@key:value]`
    Segment {
        segment_name: String,
        segment_key: String,
        segment_value: String,
    },
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Position(n) => write!(f, "{}", n),
            IndexKind::Name(name) => write!(f, "{}", name),
            IndexKind::Segment {
                segment_name,
                segment_key,
                segment_value,
            } => write!(f, "{}@{}:{}", segment_name, segment_key, segment_value),
        }
    }
}

/// One `.`-separated hop of a mapping path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub name: String,
    pub index: Option<IndexKind>,
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A dotted sequence of path elements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// One logical record of the mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRow {
    pub sequence_number: usize,
    pub file: String,
    pub kind: String,
    pub namespace: PathElement,
    pub path: Path,
    /// The first four columns exactly as written, CSV quotes included
    pub columns: String,
    /// The value column with its CSV quoting removed, before lexing
    pub raw_value: String,
}
