use super::block::BlockType;
use super::position::LocalBlockPos;
use std::collections::HashMap;

/// A sparse column of blocks, keyed by chunk-local position.
///
/// Only non-air blocks are stored; a column with no entries is dropped by
/// [`World`](super::World) so that cleared chunks cost nothing.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    blocks: HashMap<LocalBlockPos, BlockType>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_block(&self, pos: LocalBlockPos) -> BlockType {
        self.blocks.get(&pos).cloned().unwrap_or_else(BlockType::air)
    }

    pub fn set_block(&mut self, pos: LocalBlockPos, block: BlockType) {
        if block.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block);
        }
    }

    /// Replace every stored block accepted by `matches` (and by `within`) with
    /// `with`. Returns the number of blocks replaced.
    pub fn replace_where(
        &mut self,
        within: impl Fn(LocalBlockPos) -> bool,
        matches: impl Fn(&BlockType) -> bool,
        with: &BlockType,
    ) -> usize {
        let targets: Vec<LocalBlockPos> = self
            .blocks
            .iter()
            .filter(|(pos, block)| within(**pos) && matches(block))
            .map(|(pos, _)| *pos)
            .collect();
        for pos in &targets {
            self.set_block(*pos, with.clone());
        }
        targets.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
