//! Program and block structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::opcode::Opcode;

/// Identifier of a block within an [`OpProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(
    /// Zero-based block index within a program.
    pub u32,
);

impl BlockId {
    /// Entry block of every program.
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

/// A linear opcode sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpBlock {
    pub ops: Vec<Opcode>,
}

impl OpBlock {
    pub fn new(ops: Vec<Opcode>) -> Self {
        Self { ops }
    }

    /// Sum of the opcodes' declared stack effects.
    pub fn stack_effect(&self) -> isize {
        self.ops.iter().map(Opcode::stack_effect).sum()
    }
}

/// A compiled program: an arena of blocks, entry at block 0.
///
/// Sub-blocks referenced by control opcodes are appended to the same
/// arena and addressed by [`BlockId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpProgram {
    blocks: Vec<OpBlock>,
}

impl Default for OpProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl OpProgram {
    /// Creates a program with an empty root block.
    pub fn new() -> Self {
        Self {
            blocks: vec![OpBlock::default()],
        }
    }

    /// Creates a program whose root block is `ops`.
    pub fn from_ops(ops: Vec<Opcode>) -> Self {
        Self {
            blocks: vec![OpBlock::new(ops)],
        }
    }

    /// Appends a block and returns its id.
    pub fn add_block(&mut self, block: OpBlock) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    pub fn block(&self, id: BlockId) -> Option<&OpBlock> {
        self.blocks.get(id.id() as usize)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut OpBlock> {
        self.blocks.get_mut(id.id() as usize)
    }

    pub fn blocks(&self) -> &[OpBlock] {
        &self.blocks
    }

    /// Total opcode count across all blocks.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.ops.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
