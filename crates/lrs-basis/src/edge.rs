use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Flag-set over the parametric-domain boundary edges a basis function
/// touches. Accumulates with `|` exactly like the underlying bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterEdge(u8);

impl ParameterEdge {
    pub const NONE: ParameterEdge = ParameterEdge(0);
    pub const NORTH: ParameterEdge = ParameterEdge(1);
    pub const SOUTH: ParameterEdge = ParameterEdge(2);
    pub const EAST: ParameterEdge = ParameterEdge(4);
    pub const WEST: ParameterEdge = ParameterEdge(8);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: ParameterEdge) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: ParameterEdge) {
        self.0 |= other.0;
    }
}

impl BitOr for ParameterEdge {
    type Output = ParameterEdge;

    fn bitor(self, rhs: ParameterEdge) -> ParameterEdge {
        ParameterEdge(self.0 | rhs.0)
    }
}

impl BitOrAssign for ParameterEdge {
    fn bitor_assign(&mut self, rhs: ParameterEdge) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ParameterEdge {
    type Output = ParameterEdge;

    fn bitand(self, rhs: ParameterEdge) -> ParameterEdge {
        ParameterEdge(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation() {
        let mut e = ParameterEdge::NONE;
        assert!(e.is_empty());
        e.insert(ParameterEdge::NORTH);
        e |= ParameterEdge::WEST;
        assert!(e.contains(ParameterEdge::NORTH));
        assert!(e.contains(ParameterEdge::WEST));
        assert!(!e.contains(ParameterEdge::SOUTH));
        assert_eq!(e, ParameterEdge::NORTH | ParameterEdge::WEST);
    }

    #[test]
    fn test_intersection_masks() {
        let e = ParameterEdge::NORTH | ParameterEdge::EAST;
        assert_eq!(e & ParameterEdge::NORTH, ParameterEdge::NORTH);
        assert_eq!(e & ParameterEdge::SOUTH, ParameterEdge::NONE);
    }
}
