//! Vertex and normal placement for a UV sphere centred on the origin

use cgmath::BaseFloat;

use crate::circle::circle_table;
use crate::{component_count, ensure_capacity, GeometryError, Result};

/// Number of unique vertices in a sphere of `slices` x `stacks`.
///
/// Both poles are single shared vertices, every interior latitude ring
/// holds one vertex per slice. Returns 0 when there is nothing to
/// generate (`slices == 0` or `stacks < 2`). A count that does not fit
/// `usize` saturates to `usize::MAX`, which no buffer can satisfy.
pub fn vertex_count(slices: u32, stacks: u32) -> usize {
    checked_vertex_count(slices, stacks).unwrap_or(usize::MAX)
}

/// [`vertex_count`], or `None` when it overflows `usize`.
pub(crate) fn checked_vertex_count(slices: u32, stacks: u32) -> Option<usize> {
    if slices == 0 || stacks < 2 {
        return Some(0);
    }
    usize::try_from(slices)
        .ok()?
        .checked_mul(usize::try_from(stacks - 1).ok()?)?
        .checked_add(2)
}

/// Checked [`vertex_count`] as a [`Result`].
pub(crate) fn required_vertices(slices: u32, stacks: u32) -> Result<usize> {
    checked_vertex_count(slices, stacks)
        .ok_or(GeometryError::TooManySubdivisions { slices, stacks })
}

/// Fill `vertices` and `normals` with the sphere's unique vertices.
///
/// `n_vert` must come from [`vertex_count`] for the same `slices` and
/// `stacks`; both buffers need room for `3 * n_vert` components. Layout:
/// north pole first, then `stacks - 1` rings of `slices` vertices from
/// north to south, then the south pole. Each normal is the unit
/// direction of its vertex.
///
/// When `n_vert` is 0 nothing is written and the call succeeds. All
/// preconditions are checked before the first write.
pub fn generate_sphere<T: BaseFloat>(
    radius: T,
    slices: u32,
    stacks: u32,
    vertices: &mut [T],
    normals: &mut [T],
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
    let components = component_count(n_vert, slices, stacks)?;
    ensure_capacity("vertex", vertices.len(), components)?;
    ensure_capacity("normal", normals.len(), components)?;
    if !radius.is_finite() || radius <= T::zero() {
        return Err(GeometryError::InvalidRadius);
    }

    let too_many = |_| GeometryError::TooManySubdivisions { slices, stacks };
    let longitude_samples = i32::try_from(slices).map_err(too_many)?;
    let latitude_samples = i32::try_from(stacks).map_err(too_many)?;

    // Slices run clockwise around the z axis, stacks from north to south
    let longitude = circle_table::<T>(-longitude_samples, false)?;
    let latitude = circle_table::<T>(latitude_samples, true)?;

    let mut slots = vertices
        .chunks_exact_mut(3)
        .zip(normals.chunks_exact_mut(3))
        .take(n_vert);
    let mut emit = |x: T, y: T, z: T| {
        if let Some((vertex, normal)) = slots.next() {
            vertex.copy_from_slice(&[x * radius, y * radius, z * radius]);
            normal.copy_from_slice(&[x, y, z]);
        }
    };

    emit(T::zero(), T::zero(), T::one());

    for i in 1..stacks as usize {
        let sin_theta = latitude.sin()[i];
        let cos_theta = latitude.cos()[i];
        for (sin_phi, cos_phi) in longitude.iter().take(slices as usize) {
            emit(cos_phi * sin_theta, sin_phi * sin_theta, cos_theta);
        }
    }

    emit(T::zero(), T::zero(), -T::one());

    log::debug!(
        "generated sphere with {} vertices ({} slices, {} stacks)",
        n_vert,
        slices,
        stacks
    );

    Ok(())
}
