//! The geometry crate computes the buffers needed to draw a tessellated
//! sphere as triangle strips: positions, matching unit normals, and one
//! closed strip of indices per latitude band.
//!
//! Nothing here touches a GPU. Callers size their buffers with
//! [`vertex_count`] and [`index_count`], fill them with
//! [`generate_sphere`] and [`build_strip_indices`], and hand them to a
//! rendering backend. [`SphereMesh`] does all of that in one call.

mod circle;
mod mesh;
mod sphere;
mod strip;

use std::collections::TryReserveError;

pub use circle::{circle_table, CircleTable};
pub use mesh::SphereMesh;
pub use sphere::{generate_sphere, vertex_count};
pub use strip::{build_strip_indices, index_count, indices_per_strip};

/// Errors raised while generating sphere geometry
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("failed to allocate the {buffer} buffer")]
    Allocation {
        buffer: &'static str,
        #[source]
        source: TryReserveError,
    },
    #[error("vertex count {given} does not match the {expected} vertices of this tessellation")]
    VertexCountMismatch { given: usize, expected: usize },
    #[error("{buffer} buffer holds {len} entries but {required} are required")]
    BufferTooSmall {
        buffer: &'static str,
        len: usize,
        required: usize,
    },
    #[error("sphere radius must be finite and greater than zero")]
    InvalidRadius,
    #[error("{slices} slices by {stacks} stacks is too large to address")]
    TooManySubdivisions { slices: u32, stacks: u32 },
    #[error("vertex index {0} does not fit a 32-bit index buffer")]
    IndexOverflow(usize),
    #[error("sample index {0} cannot be represented in the scalar type")]
    ScalarConversion(usize),
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Reserve exactly `len` slots, reporting allocation failure instead of aborting.
pub(crate) fn try_with_capacity<V>(len: usize, buffer: &'static str) -> Result<Vec<V>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|source| GeometryError::Allocation { buffer, source })?;
    Ok(values)
}

/// Number of scalar components in `n_vert` xyz triples.
pub(crate) fn component_count(n_vert: usize, slices: u32, stacks: u32) -> Result<usize> {
    n_vert
        .checked_mul(3)
        .ok_or(GeometryError::TooManySubdivisions { slices, stacks })
}

/// Fail with [`GeometryError::BufferTooSmall`] unless `len >= required`.
pub(crate) fn ensure_capacity(buffer: &'static str, len: usize, required: usize) -> Result<()> {
    if len < required {
        return Err(GeometryError::BufferTooSmall {
            buffer,
            len,
            required,
        });
    }
    Ok(())
}
