pub mod block;
pub mod chunk;
pub mod position;

use block::BlockType;
use chunk::Chunk;
use dashmap::DashMap;
use position::{BlockPos, ChunkPos, DimensionId};
use rayon::prelude::*;

use crate::volume::Cuboid;

type ChunkKey = (DimensionId, ChunkPos);

/// In-memory mirror of the host's block world. Thread-safe, lock-sharded by
/// (dimension, chunk column).
///
/// The host stays authoritative; adapters write the blocks they care about
/// here and the ambient sweeps read and clear them.
pub struct World {
    chunks: DashMap<ChunkKey, Chunk>,
}

impl World {
    pub fn new() -> Self {
        Self {
            chunks: DashMap::new(),
        }
    }

    /// Read a block. Unknown positions are air.
    pub fn get_block(&self, dimension: &DimensionId, pos: BlockPos) -> BlockType {
        match self.chunks.get(&(dimension.clone(), pos.chunk())) {
            Some(chunk) => chunk.get_block(pos.local()),
            None => BlockType::air(),
        }
    }

    /// Write a block. Writing air drops the chunk once it holds nothing.
    ///
    /// Takes `&self` because `DashMap` provides interior mutability via
    /// per-shard locking.
    pub fn set_block(&self, dimension: &DimensionId, pos: BlockPos, block: BlockType) {
        let key = (dimension.clone(), pos.chunk());
        if block.is_air() {
            let emptied = match self.chunks.get_mut(&key) {
                Some(mut chunk) => {
                    chunk.set_block(pos.local(), block);
                    chunk.is_empty()
                }
                None => false,
            };
            if emptied {
                self.chunks.remove_if(&key, |_, chunk| chunk.is_empty());
            }
        } else {
            self.chunks
                .entry(key)
                .or_default()
                .set_block(pos.local(), block);
        }
    }

    /// Replace every block inside `cuboid` accepted by `matches` with `with`.
    ///
    /// Only chunk columns overlapping the cuboid are visited; they are
    /// processed in parallel since each lives in its own shard entry.
    pub fn replace_in_volume<F>(
        &self,
        dimension: &DimensionId,
        cuboid: &Cuboid,
        matches: F,
        with: &BlockType,
    ) -> usize
    where
        F: Fn(&BlockType) -> bool + Sync,
    {
        let keys: Vec<ChunkKey> = cuboid
            .chunks()
            .map(|pos| (dimension.clone(), pos))
            .filter(|key| self.chunks.contains_key(key))
            .collect();

        let replaced: usize = keys
            .par_iter()
            .map(|key| {
                let Some(mut chunk) = self.chunks.get_mut(key) else {
                    return 0;
                };
                let origin = key.1;
                chunk.replace_where(
                    |local| cuboid.contains_block(origin.block(local)),
                    &matches,
                    with,
                )
            })
            .sum();

        if with.is_air() {
            for key in &keys {
                self.chunks.remove_if(key, |_, chunk| chunk.is_empty());
            }
        }
        replaced
    }

    /// Number of non-air blocks stored across all dimensions.
    pub fn block_count(&self) -> usize {
        self.chunks.iter().map(|entry| entry.block_count()).sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
