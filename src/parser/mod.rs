//! Parser for mapping expressions
//!
//! A recursive descent parser with one token of lookahead. There is no separate
//! tree-walking pass: each production renders its pseudocode through
//! [`crate::translator`] as it reduces and hands a [`Fragment`] to its caller.
//!
//! Precedence, loosest first:
//! - `cond ? then : else`, right-nested, at most one nested branch per conditional
//! - `&&` / `||`, one flat left-associative chain
//! - `< <= > >= == !=`, at most one per boolean atom
//! - `.` / `?.` / `+` chaining over terminals, left to right, all at one level

pub mod ast;

use crate::errors::{PseudomapError, PseudomapResult};
use crate::lexer::token::{SourceLocation, Token, TokenKind};
use crate::translator::{self, RenderOptions, BLANK};
use ast::*;

/// Maximum parse recursion depth before the parser bails out.
const MAX_PARSE_DEPTH: usize = 128;

/// A boolean atom or chain, before it is known whether a `?` follows
enum Clause {
    /// A lone term, usable as a value
    Term(Fragment),
    /// A comparison or boolean chain, only usable as a condition
    Condition(Fragment),
}

impl Clause {
    fn into_fragment(self) -> Fragment {
        match self {
            Clause::Term(fragment) | Clause::Condition(fragment) => fragment,
        }
    }
}

/// Parser for one field's tokens
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
    /// Current recursion depth
    depth: usize,
    options: RenderOptions,
}

impl Parser {
    /// Create a new parser from a token stream
    pub fn new(mut tokens: Vec<Token>, source: impl Into<String>) -> Self {
        let source = source.into();
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = SourceLocation::new(1, source.len() + 1, source.len(), 0);
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }
        Self {
            tokens,
            pos: 0,
            source,
            depth: 0,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse a whole value field and wrap its rendering in quotes.
    ///
    /// The field may still carry its own CSV quotes (`"a ? b : c"`); they are dropped.
    pub fn parse_value(&mut self) -> PseudomapResult<Fragment> {
        let quoted = self.check(TokenKind::Quote);
        if quoted {
            self.advance();
        }

        let term = self.parse_term()?;

        if quoted {
            self.expect(TokenKind::Quote)?;
        }
        self.expect_end()?;

        let text = translator::value(&term.text);
        Ok(Fragment::new(term.expr, text))
    }

    /// Parse a field that must be a single identifier (`file`, `type`)
    pub fn parse_identifier_field(&mut self) -> PseudomapResult<String> {
        let name = self.expect_ident("identifier")?;
        self.expect_end()?;
        Ok(name)
    }

    /// Parse a field that must be a single path element (`namespace`)
    pub fn parse_path_element_field(&mut self) -> PseudomapResult<PathElement> {
        let element = self.parse_path_element()?;
        self.expect_end()?;
        Ok(element)
    }

    /// Parse a dotted path field: `a.b[2].c[seg@key:value]`
    pub fn parse_path_field(&mut self) -> PseudomapResult<Path> {
        let mut elements = vec![self.parse_path_element()?];
        while self.check(TokenKind::Dot) {
            self.advance();
            elements.push(self.parse_path_element()?);
        }
        self.expect_end()?;
        Ok(Path(elements))
    }

    fn parse_path_element(&mut self) -> PseudomapResult<PathElement> {
        let name = self.expect_ident("path element")?;
        if !self.check(TokenKind::LeftBracket) {
            return Ok(PathElement { name, index: None });
        }
        self.advance();

        let index = match self.current().kind {
            TokenKind::Integer => {
                let position = self.current().text.clone();
                self.advance();
                IndexKind::Position(position)
            }
            TokenKind::Ident => {
                let first = self.current().text.clone();
                self.advance();
                if self.check(TokenKind::At) {
                    self.advance();
                    let segment_key = self.expect_ident("segment key")?;
                    self.expect(TokenKind::Colon)?;
                    let segment_value = self.expect_ident("segment value")?;
                    IndexKind::Segment {
                        segment_name: first,
                        segment_key,
                        segment_value,
                    }
                } else {
                    IndexKind::Name(first)
                }
            }
            _ => {
                return Err(self.error_unexpected_with(
                    "index",
                    "a path index is a number, a name, or name@key:value",
                ))
            }
        };

        self.expect(TokenKind::RightBracket)?;
        Ok(PathElement {
            name,
            index: Some(index),
        })
    }

    /// Parse a term: a chained term, or a conditional
    fn parse_term(&mut self) -> PseudomapResult<Fragment> {
        self.nested(Self::parse_term_inner)
    }

    fn parse_term_inner(&mut self) -> PseudomapResult<Fragment> {
        let start = self.current_location();
        let clause = self.parse_condition()?;

        if self.check(TokenKind::Question) {
            return self.parse_ternary(clause.into_fragment(), start);
        }

        match clause {
            Clause::Term(term) => Ok(term),
            Clause::Condition(_) => Err(self.error_unexpected_with(
                "'?'",
                "a comparison or boolean chain is only valid as the condition of '? :'",
            )),
        }
    }

    /// Parse the rest of `condition ? then : else`
    fn parse_ternary(
        &mut self,
        condition: Fragment,
        start: SourceLocation,
    ) -> PseudomapResult<Fragment> {
        self.expect(TokenKind::Question)?;
        let then_branch = self.parse_term()?;
        self.expect_with(
            TokenKind::Colon,
            "a conditional needs an otherwise branch after ':'",
        )?;
        let else_branch = self.parse_term()?;

        let Some(shape) = TernaryShape::of(&then_branch.expr, &else_branch.expr) else {
            let span = start.span_to(&self.previous_location());
            return Err(PseudomapError::nested_branches(self.source.clone(), &span));
        };

        let text = translator::ternary(
            &condition.text,
            &then_branch.text,
            &else_branch.text,
            shape,
            &self.options,
        );
        let expr = Expr::Ternary {
            condition: Box::new(condition.expr),
            then_branch: Box::new(then_branch.expr),
            else_branch: Box::new(else_branch.expr),
        };
        Ok(Fragment::new(expr, text))
    }

    /// Parse a boolean chain: `atom ((&& | ||) atom)*`
    fn parse_condition(&mut self) -> PseudomapResult<Clause> {
        let first = self.parse_bool_atom()?;
        if Connector::from_token(self.current().kind).is_none() {
            return Ok(first);
        }

        let mut terms = vec![first.into_fragment()];
        let mut connectors = Vec::new();
        while let Some(connector) = Connector::from_token(self.current().kind) {
            self.advance();
            connectors.push(connector);
            terms.push(self.parse_bool_atom()?.into_fragment());
        }

        let text = translator::bool_chain(&terms, &connectors);
        let expr = Expr::BoolChain {
            terms: terms.into_iter().map(|t| t.expr).collect(),
            connectors,
        };
        Ok(Clause::Condition(Fragment::new(expr, text)))
    }

    /// Parse a boolean atom: a group, a comparison, or a lone term
    fn parse_bool_atom(&mut self) -> PseudomapResult<Clause> {
        let left = if self.check(TokenKind::LeftParen) {
            match self.parse_group()? {
                Clause::Term(term) => term,
                condition => return Ok(condition),
            }
        } else {
            self.parse_simple_term()?
        };

        let Some(op) = ComparisonOp::from_token(self.current().kind) else {
            return Ok(Clause::Term(left));
        };
        self.advance();
        let right = self.parse_operand()?;

        let text = translator::comparison(&left.text, op, &right.text);
        let expr = Expr::Comparison {
            left: Box::new(left.expr),
            op,
            right: Box::new(right.expr),
        };
        Ok(Clause::Condition(Fragment::new(expr, text)))
    }

    /// Parse the right-hand side of a comparison
    fn parse_operand(&mut self) -> PseudomapResult<Fragment> {
        if !self.check(TokenKind::LeftParen) {
            return self.parse_simple_term();
        }
        match self.parse_group()? {
            Clause::Term(term) => Ok(term),
            Clause::Condition(_) => Err(PseudomapError::unexpected_token(
                self.source.clone(),
                &self.previous_location(),
                "term",
                "condition",
                "comparisons cannot be compared again; use && or || to combine them",
            )),
        }
    }

    /// Parse `( ... )` and whatever continues it
    fn parse_group(&mut self) -> PseudomapResult<Clause> {
        self.nested(Self::parse_group_inner)
    }

    fn parse_group_inner(&mut self) -> PseudomapResult<Clause> {
        self.expect(TokenKind::LeftParen)?;
        let start = self.current_location();
        let mut inner = self.parse_condition()?;
        if self.check(TokenKind::Question) {
            inner = Clause::Term(self.parse_ternary(inner.into_fragment(), start)?);
        }
        self.expect(TokenKind::RightParen)?;

        match inner {
            // Parentheses only delimit a conditional; they are not rendered.
            Clause::Term(mut term) if term.expr.is_conditional() => {
                while self.check(TokenKind::Plus) {
                    self.advance();
                    let right = self.parse_term()?;
                    let text = translator::chain_link(&term.text, "+", &right.text);
                    let expr = Expr::Concat {
                        left: Box::new(term.expr),
                        right: Box::new(right.expr),
                    };
                    term = Fragment::new(expr, text);
                }
                Ok(Clause::Term(term))
            }
            Clause::Term(term) => {
                let grouped = Fragment::new(term.expr, translator::group(&term.text));
                Ok(Clause::Term(self.parse_chain_rest(grouped)?))
            }
            Clause::Condition(condition) => Ok(Clause::Condition(Fragment::new(
                condition.expr,
                translator::group(&condition.text),
            ))),
        }
    }

    /// Parse a chained term: `terminal (('.' | '?.' | '+') terminal)*`
    fn parse_simple_term(&mut self) -> PseudomapResult<Fragment> {
        let first = self.parse_terminal()?;
        self.parse_chain_rest(first)
    }

    fn parse_chain_rest(&mut self, mut left: Fragment) -> PseudomapResult<Fragment> {
        loop {
            let link = match self.current().kind {
                TokenKind::Dot => ".",
                TokenKind::QuestionDot => "?.",
                TokenKind::Plus => "+",
                _ => break,
            };
            self.advance();
            let right = self.parse_terminal()?;

            let text = translator::chain_link(&left.text, link, &right.text);
            let expr = if translator::is_placeholder_link(&left.text, link) {
                right.expr
            } else if link == "+" {
                Expr::Concat {
                    left: Box::new(left.expr),
                    right: Box::new(right.expr),
                }
            } else {
                Expr::PathAccess {
                    base: Box::new(left.expr),
                    field: Box::new(right.expr),
                    null_safe: link == "?.",
                }
            };
            left = Fragment::new(expr, text);
        }

        Ok(left)
    }

    /// Parse a terminal. Anything that cannot start one is an omitted
    /// sub-expression and consumes nothing.
    fn parse_terminal(&mut self) -> PseudomapResult<Fragment> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::New => {
                self.advance();
                if !(self.check(TokenKind::Ident) && self.peek_is(TokenKind::LeftParen)) {
                    return Err(self.error_unexpected_with(
                        "constructor call",
                        "'new' must be followed by a call such as Name(args)",
                    ));
                }
                let call = self.parse_call()?;
                let text = translator::construct(&call.text);
                Ok(Fragment::new(Expr::New(Box::new(call.expr)), text))
            }
            TokenKind::Ident if self.peek_is(TokenKind::LeftParen) => self.parse_call(),
            TokenKind::Ident => {
                self.advance();
                let ident = Fragment::new(Expr::identifier(&token.text), token.text);
                if self.check(TokenKind::LeftBracket) {
                    self.parse_position_index(ident)
                } else {
                    Ok(ident)
                }
            }
            TokenKind::Integer => {
                self.advance();
                let expr = Expr::Literal {
                    kind: LiteralKind::Number,
                    text: token.text.clone(),
                };
                Ok(Fragment::new(expr, token.text))
            }
            TokenKind::DoubleString | TokenKind::SingleString => {
                self.advance();
                let text = token.text;
                let expr = Expr::Literal {
                    kind: LiteralKind::String,
                    text: text.clone(),
                };
                let literal = Fragment::new(expr, text);
                if self.check(TokenKind::LeftBracket) {
                    self.parse_position_index(literal)
                } else {
                    Ok(literal)
                }
            }
            _ => Ok(Fragment::new(Expr::Blank, BLANK)),
        }
    }

    /// Parse `[n]` after a name or string
    fn parse_position_index(&mut self, base: Fragment) -> PseudomapResult<Fragment> {
        self.expect(TokenKind::LeftBracket)?;
        if !self.check(TokenKind::Integer) {
            return Err(self.error_unexpected_with(
                "integer index",
                "only literal positions such as [0] may follow a name in an expression",
            ));
        }
        let key = self.current().text.clone();
        self.advance();
        self.expect(TokenKind::RightBracket)?;

        let text = translator::index(&base.text, &key);
        let expr = Expr::Index {
            base: Box::new(base.expr),
            key: Box::new(Expr::Literal {
                kind: LiteralKind::Number,
                text: key,
            }),
        };
        Ok(Fragment::new(expr, text))
    }

    /// Parse `name(args...)`
    fn parse_call(&mut self) -> PseudomapResult<Fragment> {
        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LeftParen)?;

        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_term()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let text = translator::call(&name, &args);
        let expr = Expr::Call {
            name,
            args: args.into_iter().map(|a| a.expr).collect(),
        };
        Ok(Fragment::new(expr, text))
    }

    // Helper methods

    /// Run a recursive production under the depth limit
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> PseudomapResult<T>,
    ) -> PseudomapResult<T> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            let loc = self.current_location();
            self.depth -= 1;
            return Err(PseudomapError::RecursionLimitExceeded {
                src: self.source.clone(),
                span: (loc.offset, loc.length).into(),
                help: format!(
                    "expression nesting exceeds maximum depth of {}",
                    MAX_PARSE_DEPTH
                ),
            });
        }
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Get the current token
    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Get the current token's location
    fn current_location(&self) -> SourceLocation {
        self.current().location
    }

    /// Get the previous token's location
    fn previous_location(&self) -> SourceLocation {
        if self.pos > 0 {
            self.tokens[self.pos - 1].location
        } else {
            self.current_location()
        }
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// Check if current token matches expected kind
    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Check if next token matches expected kind
    fn peek_is(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|token| token.kind == kind)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Expect a specific token kind
    fn expect(&mut self, kind: TokenKind) -> PseudomapResult<()> {
        self.expect_with(kind, "check syntax")
    }

    fn expect_with(&mut self, kind: TokenKind, help: &str) -> PseudomapResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_unexpected_with(&kind.to_string(), help))
        }
    }

    /// Expect an identifier and return its text
    fn expect_ident(&mut self, context: &str) -> PseudomapResult<String> {
        if self.check(TokenKind::Ident) {
            let name = self.current().text.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_unexpected_with(context, "check syntax"))
        }
    }

    /// Every token must be consumed
    fn expect_end(&mut self) -> PseudomapResult<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error_unexpected_with(
                "end of expression",
                "the expression continues after it should have ended; check brackets and quotes",
            ))
        }
    }

    /// Create an "unexpected token" error
    fn error_unexpected_with(&self, expected: &str, help: &str) -> PseudomapError {
        let current = self.current();
        let found = if current.kind == TokenKind::Eof {
            current.kind.to_string()
        } else {
            format!("'{}'", current.text)
        };
        PseudomapError::unexpected_token(
            self.source.clone(),
            &current.location,
            expected,
            found,
            help,
        )
    }
}
