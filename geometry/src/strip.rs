//! Triangle strip indices, one closed strip per latitude band

use crate::sphere::required_vertices;
use crate::{ensure_capacity, GeometryError, Result};

/// Number of indices in one latitude band's strip (one part).
///
/// Saturates to `usize::MAX` if the count does not fit.
pub fn indices_per_strip(slices: u32) -> usize {
    checked_indices_per_strip(slices).unwrap_or(usize::MAX)
}

/// Number of indices for the whole sphere: one strip per stack.
///
/// Saturates to `usize::MAX` if the count does not fit.
pub fn index_count(slices: u32, stacks: u32) -> usize {
    checked_index_count(slices, stacks).unwrap_or(usize::MAX)
}

fn checked_indices_per_strip(slices: u32) -> Option<usize> {
    usize::try_from(slices).ok()?.checked_add(1)?.checked_mul(2)
}

pub(crate) fn checked_index_count(slices: u32, stacks: u32) -> Option<usize> {
    checked_indices_per_strip(slices)?.checked_mul(usize::try_from(stacks).ok()?)
}

/// Fill `indices` with `stacks` triangle strips covering the sphere.
///
/// Strips run from the north pole band to the south pole band. Each one
/// alternates between the lower and upper edge of its band and is
/// closed by repeating its first pair, so strip `i` occupies
/// `indices[i * per_strip..(i + 1) * per_strip]` where `per_strip` is
/// [`indices_per_strip`]. Vertex numbering follows
/// [`generate_sphere`](crate::generate_sphere).
///
/// When `n_vert` is 0 nothing is written.
pub fn build_strip_indices(
    indices: &mut [u32],
    slices: u32,
    stacks: u32,
    n_vert: usize,
) -> Result<()> {
    if n_vert == 0 {
        return Ok(());
    }

    let expected = required_vertices(slices, stacks)?;
    if n_vert != expected {
        return Err(GeometryError::VertexCountMismatch {
            given: n_vert,
            expected,
        });
    }
    let required = checked_index_count(slices, stacks)
        .ok_or(GeometryError::TooManySubdivisions { slices, stacks })?;
    ensure_capacity("index", indices.len(), required)?;
    // Every index is at most the south pole's
    let south = u32::try_from(n_vert - 1).map_err(|_| GeometryError::IndexOverflow(n_vert - 1))?;

    let mut slots = indices.iter_mut();
    let mut pair = |first: u32, second: u32| {
        for (index, slot) in [first, second].into_iter().zip(slots.by_ref()) {
            *slot = index;
        }
    };

    // Top band fans around the north pole, vertex 0
    for j in 0..slices {
        pair(j + 1, 0);
    }
    pair(1, 0);

    for i in 0..stacks - 2 {
        let offset = 1 + i * slices;
        for j in 0..slices {
            pair(offset + j + slices, offset + j);
        }
        pair(offset + slices, offset);
    }

    // Bottom band fans around the south pole, the last vertex
    let offset = 1 + (stacks - 2) * slices;
    for j in 0..slices {
        pair(south, offset + j);
    }
    pair(south, offset);

    log::trace!("built {} strip indices for {} stacks", required, stacks);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex_count;

    fn build(slices: u32, stacks: u32) -> Vec<u32> {
        let n_vert = vertex_count(slices, stacks);
        let mut indices = vec![u32::MAX; index_count(slices, stacks)];
        build_strip_indices(&mut indices, slices, stacks, n_vert).unwrap();
        indices
    }

    #[test]
    fn test_index_counts() {
        assert_eq!(indices_per_strip(4), 10);
        assert_eq!(indices_per_strip(0), 2);
        assert_eq!(index_count(4, 3), 30);
        assert_eq!(index_count(16, 8), 34 * 8);
    }

    #[test]
    fn test_small_sphere_layout() {
        let indices = build(4, 3);
        assert_eq!(indices.len(), 3 * (4 + 1) * 2);

        #[rustfmt::skip]
        let expected = [
            // top band
            1, 0, 2, 0, 3, 0, 4, 0, 1, 0,
            // middle band
            5, 1, 6, 2, 7, 3, 8, 4, 5, 1,
            // bottom band
            9, 5, 9, 6, 9, 7, 9, 8, 9, 5,
        ];
        assert_eq!(indices, expected);
    }

    #[test]
    fn test_strips_are_closed() {
        let slices = 7;
        let stacks = 6;
        let per_strip = indices_per_strip(slices);
        let indices = build(slices, stacks);

        assert_eq!(indices.len(), stacks as usize * per_strip);
        for strip in indices.chunks_exact(per_strip) {
            assert_eq!(strip[0..2], strip[per_strip - 2..]);
        }
    }

    #[test]
    fn test_poles_are_shared() {
        let slices = 5;
        let stacks = 4;
        let per_strip = indices_per_strip(slices);
        let n_vert = vertex_count(slices, stacks);
        let indices = build(slices, stacks);

        let top = &indices[..per_strip];
        assert!(top.iter().skip(1).step_by(2).all(|&i| i == 0));

        let bottom = &indices[indices.len() - per_strip..];
        assert!(bottom.iter().step_by(2).all(|&i| i as usize == n_vert - 1));

        // Poles never appear in the middle bands
        for strip in indices[per_strip..indices.len() - per_strip].chunks_exact(per_strip) {
            assert!(strip.iter().all(|&i| i != 0 && i as usize != n_vert - 1));
        }
    }

    #[test]
    fn test_indices_reference_every_vertex() {
        let slices = 9;
        let stacks = 5;
        let n_vert = vertex_count(slices, stacks);
        let indices = build(slices, stacks);

        let mut seen = vec![false; n_vert];
        for &index in &indices {
            assert!((index as usize) < n_vert);
            seen[index as usize] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_two_stacks_have_no_middle_band() {
        let indices = build(3, 2);
        assert_eq!(indices, [1, 0, 2, 0, 3, 0, 1, 0, 4, 1, 4, 2, 4, 3, 4, 1]);
    }

    #[test]
    fn test_degenerate_writes_nothing() {
        let mut indices = [42u32; 8];
        build_strip_indices(&mut indices, 0, 3, 0).unwrap();
        build_strip_indices(&mut indices, 3, 1, 0).unwrap();
        assert!(indices.iter().all(|&i| i == 42));
    }

    #[test]
    fn test_rejects_undersized_buffer() {
        let n_vert = vertex_count(4, 3);
        let mut indices = vec![0u32; index_count(4, 3) - 2];
        let err = build_strip_indices(&mut indices, 4, 3, n_vert).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::BufferTooSmall {
                buffer: "index",
                len: 28,
                required: 30
            }
        ));
    }

    #[test]
    fn test_counts_saturate_instead_of_overflowing() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(indices_per_strip(u32::MAX), (u32::MAX as usize + 1) * 2);
        assert_eq!(index_count(u32::MAX, u32::MAX), usize::MAX);
        assert_eq!(checked_index_count(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_huge_tessellation_is_rejected() {
        let n_vert = vertex_count(u32::MAX, u32::MAX);
        let err = build_strip_indices(&mut [], u32::MAX, u32::MAX, n_vert).unwrap_err();
        assert!(matches!(err, GeometryError::TooManySubdivisions { .. }));

        // A small count that a wrapped product could have produced
        let mut indices = [0u32; 30];
        let err = build_strip_indices(&mut indices, u32::MAX, u32::MAX, 10).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::VertexCountMismatch { .. } | GeometryError::TooManySubdivisions { .. }
        ));
        assert!(indices.iter().all(|&i| i == 0));
    }

    #[test]
    fn test_rejects_mismatched_vertex_count() {
        let mut indices = vec![0u32; index_count(4, 3)];
        let err = build_strip_indices(&mut indices, 4, 3, 12).unwrap_err();
        assert!(matches!(err, GeometryError::VertexCountMismatch { .. }));
    }
}
