//! Condition expressions over labelled atoms.
//!
//! ```text
//! expr     := or_expr
//! or_expr  := xor_expr (("OR" | "OU") xor_expr)*
//! xor_expr := and_expr ("XOR" and_expr)*
//! and_expr := not_expr (("AND" | "ET") not_expr)*
//! not_expr := ("NOT" | "NON") not_expr | primary
//! primary  := LABEL | "(" expr ")"
//! ```
//!
//! Keywords and labels are case-insensitive. Parentheses are tokens on
//! their own, everything else is split on whitespace.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseErrorKind};

/// Positional label of an atom: `C1` is the first atom of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AtomLabel(usize);

impl AtomLabel {
    /// Label of the atom stored at zero-based `index`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// Zero-based position in the atom table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for AtomLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl FromStr for AtomLabel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        label_number(s).map(Self).ok_or_else(|| ParseError {
            kind: ParseErrorKind::InvalidToken,
            token: s.to_string(),
            position: 0,
        })
    }
}

impl TryFrom<String> for AtomLabel {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AtomLabel> for String {
    fn from(label: AtomLabel) -> Self {
        label.to_string()
    }
}

fn label_number(word: &str) -> Option<usize> {
    let digits = word.strip_prefix(['C', 'c'])?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n >= 1)
}

/// Boolean tree over atom labels.
///
/// `And`, `Or` and `Xor` hold two or more children. A chain of the same
/// operator is collected into one node, parenthesized groups stay nested.
///
/// `Xor` is true when **exactly one** child is true, so `C1 XOR C2 XOR C3`
/// with all three true is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionExpr {
    Atom { label: AtomLabel },
    Not { expr: Box<ConditionExpr> },
    And { children: Vec<ConditionExpr> },
    Or { children: Vec<ConditionExpr> },
    Xor { children: Vec<ConditionExpr> },
}

impl ConditionExpr {
    #[must_use]
    pub fn atom(label: AtomLabel) -> Self {
        Self::Atom { label }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Self) -> Self {
        Self::Not {
            expr: Box::new(expr),
        }
    }

    /// Collapse `children` into an `And` node, or return the single child.
    #[must_use]
    pub fn and(children: Vec<Self>) -> Self {
        Self::nary(children, |children| Self::And { children })
    }

    #[must_use]
    pub fn or(children: Vec<Self>) -> Self {
        Self::nary(children, |children| Self::Or { children })
    }

    #[must_use]
    pub fn xor(children: Vec<Self>) -> Self {
        Self::nary(children, |children| Self::Xor { children })
    }

    fn nary(mut children: Vec<Self>, wrap: impl FnOnce(Vec<Self>) -> Self) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            wrap(children)
        }
    }

    /// Evaluate with `atom` deciding each leaf.
    ///
    /// `And` stops at the first false child and `Or` at the first true one.
    /// `Xor` looks at every child.
    pub fn evaluate<F>(&self, atom: &F) -> bool
    where
        F: Fn(AtomLabel) -> bool,
    {
        match self {
            Self::Atom { label } => atom(*label),
            Self::Not { expr } => !expr.evaluate(atom),
            Self::And { children } => children.iter().all(|c| c.evaluate(atom)),
            Self::Or { children } => children.iter().any(|c| c.evaluate(atom)),
            Self::Xor { children } => {
                children.iter().filter(|c| c.evaluate(atom)).count() == 1
            }
        }
    }

    /// Every label the tree references.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<AtomLabel> {
        let mut out = BTreeSet::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels(&self, out: &mut BTreeSet<AtomLabel>) {
        match self {
            Self::Atom { label } => {
                out.insert(*label);
            }
            Self::Not { expr } => expr.collect_labels(out),
            Self::And { children } | Self::Or { children } | Self::Xor { children } => {
                for child in children {
                    child.collect_labels(out);
                }
            }
        }
    }

    fn is_nary(&self) -> bool {
        matches!(self, Self::And { .. } | Self::Or { .. } | Self::Xor { .. })
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nary() {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, children) = match self {
            Self::Atom { label } => return write!(f, "{label}"),
            Self::Not { expr } => {
                f.write_str("NOT ")?;
                return expr.fmt_operand(f);
            }
            Self::And { children } => ("AND", children),
            Self::Or { children } => ("OR", children),
            Self::Xor { children } => ("XOR", children),
        };
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, " {op} ")?;
            }
            child.fmt_operand(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    And,
    Or,
    Xor,
    Not,
    Label(usize),
}

#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    position: usize,
}

fn classify(raw: &str, position: usize) -> Result<Token<'_>, ParseError> {
    let kind = match raw.to_ascii_uppercase().as_str() {
        "(" => TokenKind::Open,
        ")" => TokenKind::Close,
        "AND" | "ET" => TokenKind::And,
        "OR" | "OU" => TokenKind::Or,
        "XOR" => TokenKind::Xor,
        "NOT" | "NON" => TokenKind::Not,
        other => TokenKind::Label(label_number(other).ok_or_else(|| ParseError {
            kind: ParseErrorKind::InvalidToken,
            token: raw.to_string(),
            position,
        })?),
    };
    Ok(Token {
        kind,
        text: raw,
        position,
    })
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    // byte offset and char position of the word being read
    let mut word: Option<(usize, usize)> = None;
    for (position, (offset, c)) in text.char_indices().enumerate() {
        let is_paren = c == '(' || c == ')';
        if c.is_whitespace() || is_paren {
            if let Some((start, at)) = word.take() {
                tokens.push(classify(&text[start..offset], at)?);
            }
            if is_paren {
                tokens.push(classify(&text[offset..=offset], position)?);
            }
        } else if word.is_none() {
            word = Some((offset, position));
        }
    }
    if let Some((start, at)) = word {
        tokens.push(classify(&text[start..], at)?);
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    depth: usize,
    atom_count: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.cursor).map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn error(kind: ParseErrorKind, token: &Token<'_>) -> ParseError {
        ParseError {
            kind,
            token: token.text.to_string(),
            position: token.position,
        }
    }

    fn end_of_input(&self) -> ParseError {
        ParseError {
            kind: ParseErrorKind::UnexpectedEnd,
            token: String::new(),
            position: self.end,
        }
    }

    fn chain(
        &mut self,
        op: TokenKind,
        operand: fn(&mut Self) -> Result<ConditionExpr, ParseError>,
        wrap: fn(Vec<ConditionExpr>) -> ConditionExpr,
    ) -> Result<ConditionExpr, ParseError> {
        let mut children = vec![operand(self)?];
        while self.peek() == Some(op) {
            self.cursor += 1;
            children.push(operand(self)?);
        }
        Ok(wrap(children))
    }

    fn or_expr(&mut self) -> Result<ConditionExpr, ParseError> {
        self.chain(TokenKind::Or, Self::xor_expr, ConditionExpr::or)
    }

    fn xor_expr(&mut self) -> Result<ConditionExpr, ParseError> {
        self.chain(TokenKind::Xor, Self::and_expr, ConditionExpr::xor)
    }

    fn and_expr(&mut self) -> Result<ConditionExpr, ParseError> {
        self.chain(TokenKind::And, Self::not_expr, ConditionExpr::and)
    }

    fn not_expr(&mut self) -> Result<ConditionExpr, ParseError> {
        if self.peek() == Some(TokenKind::Not) {
            self.cursor += 1;
            return Ok(ConditionExpr::not(self.not_expr()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ConditionExpr, ParseError> {
        let token = self.advance().ok_or_else(|| self.end_of_input())?;
        match token.kind {
            TokenKind::Label(n) if n <= self.atom_count => {
                Ok(ConditionExpr::atom(AtomLabel(n)))
            }
            TokenKind::Label(_) => Err(Self::error(ParseErrorKind::UnknownLabel, &token)),
            TokenKind::Open => {
                self.depth += 1;
                let inner = self.or_expr()?;
                match self.advance() {
                    Some(close) if close.kind == TokenKind::Close => {
                        self.depth -= 1;
                        Ok(inner)
                    }
                    Some(other) => Err(Self::error(ParseErrorKind::UnexpectedToken, &other)),
                    None => Err(Self::error(ParseErrorKind::UnclosedParen, &token)),
                }
            }
            TokenKind::Close if self.depth == 0 => {
                Err(Self::error(ParseErrorKind::UnmatchedParen, &token))
            }
            _ => Err(Self::error(ParseErrorKind::UnexpectedToken, &token)),
        }
    }
}

/// Parse `text` over a table of `atom_count` atoms (labels `C1..=Cn`).
///
/// # Errors
///
/// Returns a [`ParseError`] naming the offending token and its character
/// position. No partial tree is ever returned.
pub fn parse(text: &str, atom_count: usize) -> Result<ConditionExpr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Empty,
            token: String::new(),
            position: 0,
        });
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        atom_count,
        end: text.chars().count(),
    };
    let expr = parser.or_expr()?;
    match parser.advance() {
        None => Ok(expr),
        Some(token) if token.kind == TokenKind::Close => {
            Err(Parser::error(ParseErrorKind::UnmatchedParen, &token))
        }
        Some(token) => Err(Parser::error(ParseErrorKind::UnexpectedToken, &token)),
    }
}
