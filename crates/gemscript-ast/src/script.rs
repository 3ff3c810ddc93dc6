//! Statement arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Statement;

/// Identifier of a statement block within a [`Script`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(
    /// Zero-based index into the script's block list.
    pub u32,
);

impl BlockId {
    /// The top-level block of every script.
    pub const ROOT: BlockId = BlockId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

/// A parsed script: an arena of statement blocks.
///
/// Block 0 holds the top-level statements. Nested blocks are allocated in
/// the order their opening token appears, so two scripts built from the
/// same source compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    blocks: Vec<Vec<Statement>>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Script {
    /// Creates a script with an empty root block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Vec::new()],
        }
    }

    /// Creates a script whose root block holds `statements`.
    pub fn from_statements(statements: Vec<Statement>) -> Self {
        Self {
            blocks: vec![statements],
        }
    }

    /// Allocates a new, empty block and returns its id.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Vec::new());
        id
    }

    /// Allocates a block holding `statements` and returns its id.
    pub fn add_block(&mut self, statements: Vec<Statement>) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(statements);
        id
    }

    /// Appends a statement to an existing block.
    ///
    /// Returns `false` if the block does not exist.
    pub fn push(&mut self, block: BlockId, statement: Statement) -> bool {
        match self.blocks.get_mut(block.id() as usize) {
            Some(statements) => {
                statements.push(statement);
                true
            }
            None => false,
        }
    }

    /// Top-level statements.
    pub fn statements(&self) -> &[Statement] {
        self.blocks.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn block(&self, id: BlockId) -> Option<&[Statement]> {
        self.blocks.get(id.id() as usize).map(Vec::as_slice)
    }

    /// All blocks with their ids, root first.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &[Statement])> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, stmts)| (BlockId::new(i as u32), stmts.as_slice()))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    #[test]
    fn test_root_block_is_zero() {
        let script = Script::new();
        assert_eq!(script.block_count(), 1);
        assert!(script.block(BlockId::ROOT).unwrap().is_empty());
    }

    #[test]
    fn test_nested_blocks_by_id() {
        let mut script = Script::new();
        let body = script.new_block();
        assert!(script.push(body, Statement::new(vec![Token::ident("dbgOut")])));
        assert!(script.push(
            BlockId::ROOT,
            Statement::new(vec![
                Token::ident("repeat"),
                Token::literal(2.0),
                Token::Block(body)
            ])
        ));
        assert_eq!(script.statements().len(), 1);
        assert_eq!(script.block(body).unwrap().len(), 1);
        assert!(!script.push(BlockId::new(9), Statement::default()));
    }
}
