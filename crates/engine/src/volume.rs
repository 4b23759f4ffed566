//! Axis-aligned block volumes.
//!
//! A [`Cuboid`] is always stored normalized (`min <= max` on every axis) and
//! is inclusive on both ends, so a cuboid built from a single corner twice is
//! one block, not empty.

use serde::{Deserialize, Serialize};

use crate::world::position::{BlockPos, ChunkPos, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cuboid {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Cuboid {
    /// Build the box spanned by two corners given in any order.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Number of blocks inside the box.
    pub fn capacity(&self) -> u64 {
        let dx = (self.max.x - self.min.x).unsigned_abs() + 1;
        let dy = (self.max.y - self.min.y).unsigned_abs() + 1;
        let dz = (self.max.z - self.min.z).unsigned_abs() + 1;
        dx.saturating_mul(dy).saturating_mul(dz)
    }

    /// True when the two corners coincide on at least one axis.
    pub fn is_degenerate(&self) -> bool {
        self.min.x == self.max.x || self.min.y == self.max.y || self.min.z == self.max.z
    }

    /// Containment test for a world position.
    ///
    /// The point is snapped to the nearest block first. The vertical range
    /// extends one block below `min.y` so an actor standing on the claim's
    /// ground surface still counts as inside.
    pub fn contains(&self, point: Location) -> bool {
        let p = point.block();
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y - 1..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    /// Strict inclusive containment of a block, without the ground tolerance.
    pub fn contains_block(&self, pos: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// True if the boxes share at least one block or sit flush against each
    /// other on a face. Boxes meeting only along an edge or at a corner do not
    /// touch.
    pub fn touches(&self, other: &Cuboid) -> bool {
        let gaps = [
            axis_gap(self.min.x, self.max.x, other.min.x, other.max.x),
            axis_gap(self.min.y, self.max.y, other.min.y, other.max.y),
            axis_gap(self.min.z, self.max.z, other.min.z, other.max.z),
        ];
        if gaps.iter().any(|&gap| gap > 1) {
            return false;
        }
        gaps.iter().filter(|&&gap| gap == 1).count() <= 1
    }

    /// Every chunk column the box overlaps.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> + use<> {
        let (lo, hi) = (self.min.chunk(), self.max.chunk());
        (lo.x..=hi.x).flat_map(move |x| (lo.z..=hi.z).map(move |z| ChunkPos::new(x, z)))
    }
}

/// Distance between two inclusive integer ranges: `<= 0` when they overlap,
/// `1` when they are adjacent, larger when there is empty space between them.
fn axis_gap(a_min: i64, a_max: i64, b_min: i64, b_max: i64) -> i64 {
    a_min.max(b_min) - a_max.min(b_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuboid(a: (i64, i64, i64), b: (i64, i64, i64)) -> Cuboid {
        Cuboid::from_corners(BlockPos::new(a.0, a.1, a.2), BlockPos::new(b.0, b.1, b.2))
    }

    #[test]
    fn corner_order_does_not_matter() {
        let a = BlockPos::new(10, 64, -3);
        let b = BlockPos::new(-2, 70, 8);
        assert_eq!(Cuboid::from_corners(a, b), Cuboid::from_corners(b, a));
        let mixed = Cuboid::from_corners(BlockPos::new(10, 64, 8), BlockPos::new(-2, 70, -3));
        assert_eq!(mixed, Cuboid::from_corners(a, b));
    }

    #[test]
    fn capacity_counts_inclusive_blocks() {
        assert_eq!(cuboid((0, 64, 0), (10, 70, 10)).capacity(), 847);
        assert_eq!(cuboid((5, 5, 5), (5, 5, 5)).capacity(), 1);
    }

    #[test]
    fn degenerate_on_any_axis() {
        assert!(cuboid((0, 0, 0), (0, 5, 5)).is_degenerate());
        assert!(cuboid((0, 0, 0), (5, 0, 5)).is_degenerate());
        assert!(cuboid((0, 0, 0), (5, 5, 0)).is_degenerate());
        assert!(!cuboid((0, 0, 0), (1, 1, 1)).is_degenerate());
    }

    #[test]
    fn contains_both_corners() {
        let c = cuboid((10, 70, 10), (0, 64, 0));
        assert!(c.contains(c.min.to_location()));
        assert!(c.contains(c.max.to_location()));
    }

    #[test]
    fn contains_rounds_and_tolerates_ground() {
        let c = cuboid((0, 64, 0), (10, 70, 10));
        assert!(c.contains(Location::new(10.4, 70.4, -0.4)));
        assert!(!c.contains(Location::new(10.6, 68.0, 5.0)));
        // Standing on the block below the floor.
        assert!(c.contains(Location::new(5.0, 63.0, 5.0)));
        assert!(!c.contains(Location::new(5.0, 62.0, 5.0)));
        assert!(!c.contains(Location::new(5.0, 71.0, 5.0)));
        assert!(!c.contains_block(BlockPos::new(5, 63, 5)));
    }

    #[test]
    fn touching_includes_overlap_and_flush_faces() {
        let home = cuboid((0, 64, 0), (10, 70, 10));
        assert!(home.touches(&cuboid((5, 64, 5), (15, 70, 15))));
        // Flush on the x face.
        assert!(home.touches(&cuboid((11, 64, 0), (20, 70, 10))));
        // One block of space between them.
        assert!(!home.touches(&cuboid((12, 64, 0), (20, 70, 10))));
        // Meeting only along a vertical edge.
        assert!(!home.touches(&cuboid((11, 64, 11), (20, 70, 20))));
        // Stacked directly on top.
        assert!(home.touches(&cuboid((0, 71, 0), (10, 80, 10))));
        assert!(home.touches(&home));
    }

    #[test]
    fn chunks_cover_box() {
        let c = cuboid((-1, 0, 0), (16, 5, 15));
        let chunks: Vec<ChunkPos> = c.chunks().collect();
        assert_eq!(
            chunks,
            vec![
                ChunkPos::new(-1, 0),
                ChunkPos::new(0, 0),
                ChunkPos::new(1, 0),
            ]
        );
    }
}
