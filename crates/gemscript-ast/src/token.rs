//! Tokens and statements.

use serde::{Deserialize, Serialize};

use gemscript_foundation::Value;

use crate::script::BlockId;

/// Keyword identifier given to `#` pragma lines.
pub const PRAGMA: &str = "_pragma";

/// The shape of a token, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    ObjRef,
    Literal,
    Block,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::ObjRef => "objref",
            TokenKind::Literal => "literal",
            TokenKind::Block => "block",
        }
    }
}

/// One lexical unit of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A bare name: keyword, method, feature or prop name.
    Identifier(String),
    /// A dotted reference such as `agent.Movement.direction`.
    ObjRef(Vec<String>),
    /// A number, string, boolean or null literal.
    Literal(Value),
    /// A nested block of statements, stored in the script arena.
    Block(BlockId),
}

impl Token {
    pub fn ident(name: impl Into<String>) -> Self {
        Token::Identifier(name.into())
    }

    /// Build an objref from a dotted string. A single segment yields an
    /// identifier.
    pub fn objref(path: &str) -> Self {
        let parts: Vec<String> = path.split('.').map(String::from).collect();
        if parts.len() == 1 {
            Token::Identifier(path.to_string())
        } else {
            Token::ObjRef(parts)
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Token::Literal(value.into())
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Identifier(_) => TokenKind::Identifier,
            Token::ObjRef(_) => TokenKind::ObjRef,
            Token::Literal(_) => TokenKind::Literal,
            Token::Block(_) => TokenKind::Block,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn objref_parts(&self) -> Option<&[String]> {
        match self {
            Token::ObjRef(parts) => Some(parts),
            _ => None,
        }
    }

    /// Reference segments of an identifier or objref.
    ///
    /// A bare identifier is a one-segment reference.
    pub fn ref_parts(&self) -> Option<Vec<&str>> {
        match self {
            Token::Identifier(name) => Some(vec![name.as_str()]),
            Token::ObjRef(parts) => Some(parts.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match self {
            Token::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn block(&self) -> Option<BlockId> {
        match self {
            Token::Block(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_pragma(&self) -> bool {
        self.identifier() == Some(PRAGMA)
    }
}

/// An ordered sequence of tokens; the first names the keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub tokens: Vec<Token>,
}

impl Statement {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Keyword name, if the first token is an identifier.
    pub fn keyword(&self) -> Option<&str> {
        self.tokens.first().and_then(Token::identifier)
    }

    /// Tokens after the keyword.
    pub fn args(&self) -> &[Token] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Block ids referenced by this statement, in order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.tokens.iter().filter_map(Token::block)
    }

    /// Index of the first block token, if any.
    pub fn first_block_index(&self) -> Option<usize> {
        self.tokens.iter().position(|t| t.kind() == TokenKind::Block)
    }
}
