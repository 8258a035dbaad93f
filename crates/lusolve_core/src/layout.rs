//! Cache and register geometry the storage layers are padded against.
//!
//! The values here describe a common x86-64 target (64-byte L1 lines,
//! 256-bit vector registers, 32 KiB L1d). They are compile-time tuning
//! constants; re-measure before changing them for another platform.

/// Number of `f64` elements per L1 cache line.
pub const LINE_D: usize = 8;

/// Substitution tile size, in rows/columns. One tile of solved values plus
/// a tile-wide stripe of coefficients must fit in L1.
pub const BL1: usize = 32;

/// Number of `f64` elements in one SIMD lane group.
pub const REG_W: usize = 4;

/// In-memory leading dimension for a dense matrix of logical size `n`.
///
/// Rounds `n` up to a multiple of [`LINE_D`], then bumps a power-of-two
/// result past the next line so that consecutive rows never map to the
/// same L1 set run.
pub fn padded_dim(n: usize) -> usize {
    let mut n_mem = n.next_multiple_of(LINE_D);
    if n_mem > LINE_D && n_mem.is_power_of_two() {
        n_mem += LINE_D;
    }
    n_mem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_dim_is_line_aligned_and_never_a_large_power_of_two() {
        for n in 1..=256 {
            let n_mem = padded_dim(n);
            assert!(n_mem >= n);
            assert_eq!(n_mem % LINE_D, 0, "n = {n}");
            assert!(
                !(n_mem > LINE_D && n_mem.is_power_of_two()),
                "n = {n} produced power-of-two leading dimension {n_mem}"
            );
        }
    }

    #[test]
    fn padded_dim_small_sizes() {
        assert_eq!(padded_dim(1), 8);
        assert_eq!(padded_dim(8), 8);
        assert_eq!(padded_dim(9), 24);
        assert_eq!(padded_dim(16), 24);
        assert_eq!(padded_dim(17), 24);
        assert_eq!(padded_dim(100), 104);
        assert_eq!(padded_dim(128), 136);
    }
}
