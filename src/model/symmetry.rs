//! Dihedral orientation groups for tile symmetry classes
//!
//! Each symmetry symbol names the subgroup of D₄ a tile is invariant under.
//! The kernel exposes the two generators of the remaining orientation orbit:
//! `rotate` is a 90° turn, `reflect` mirrors across the symmetry's canonical
//! axis.

/// Generators and orbit size for one symmetry class
#[derive(Clone, Copy, Debug)]
pub struct SymmetryKernel {
    /// Number of distinct orientations the tile can assume
    pub cardinality: usize,
    rotate: fn(usize) -> usize,
    reflect: fn(usize) -> usize,
}

impl SymmetryKernel {
    /// Orientation reached by a 90° rotation
    pub fn rotate(&self, orientation: usize) -> usize {
        (self.rotate)(orientation)
    }

    /// Orientation reached by the canonical reflection
    pub fn reflect(&self, orientation: usize) -> usize {
        (self.reflect)(orientation)
    }
}

/// Look up the orientation kernel for a symmetry symbol
///
/// Known symbols are `L`, `T`, `I`, and `\`; anything else is treated as
/// fully symmetric (a single orientation).
pub fn kernel(symbol: &str) -> SymmetryKernel {
    match symbol {
        "L" => SymmetryKernel {
            cardinality: 4,
            rotate: |i| (i + 1) % 4,
            reflect: |i| if i % 2 == 0 { i + 1 } else { i - 1 },
        },
        "T" => SymmetryKernel {
            cardinality: 4,
            rotate: |i| (i + 1) % 4,
            reflect: |i| if i % 2 == 0 { i } else { 4 - i },
        },
        "I" => SymmetryKernel {
            cardinality: 2,
            rotate: |i| 1 - i,
            reflect: |i| i,
        },
        "\\" => SymmetryKernel {
            cardinality: 2,
            rotate: |i| 1 - i,
            reflect: |i| 1 - i,
        },
        _ => SymmetryKernel {
            cardinality: 1,
            rotate: |i| i,
            reflect: |i| i,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_kernel() {
        let k = kernel("L");
        assert_eq!(k.cardinality, 4);
        assert_eq!(k.rotate(3), 0);
        assert_eq!(k.reflect(0), 1);
        assert_eq!(k.reflect(1), 0);
        assert_eq!(k.reflect(3), 2);
    }

    #[test]
    fn test_tee_kernel() {
        let k = kernel("T");
        assert_eq!(k.cardinality, 4);
        assert_eq!(k.reflect(0), 0);
        assert_eq!(k.reflect(1), 3);
        assert_eq!(k.reflect(2), 2);
        assert_eq!(k.reflect(3), 1);
    }

    #[test]
    fn test_line_kernel() {
        let k = kernel("I");
        assert_eq!(k.cardinality, 2);
        assert_eq!(k.rotate(0), 1);
        assert_eq!(k.rotate(1), 0);
        assert_eq!(k.reflect(0), 0);
        assert_eq!(k.reflect(1), 1);
    }

    #[test]
    fn test_diagonal_kernel() {
        let k = kernel("\\");
        assert_eq!(k.cardinality, 2);
        assert_eq!(k.rotate(0), 1);
        assert_eq!(k.reflect(0), 1);
        assert_eq!(k.reflect(1), 0);
    }

    #[test]
    fn test_unknown_symbol_is_trivial() {
        for symbol in ["X", "", "anything"] {
            let k = kernel(symbol);
            assert_eq!(k.cardinality, 1);
            assert_eq!(k.rotate(0), 0);
            assert_eq!(k.reflect(0), 0);
        }
    }

    #[test]
    fn test_rotation_has_full_period() {
        for symbol in ["L", "T"] {
            let k = kernel(symbol);
            let mut orientation = 0;
            for _ in 0..4 {
                orientation = k.rotate(orientation);
            }
            assert_eq!(orientation, 0);
        }
    }
}
