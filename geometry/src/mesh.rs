//! Owned sphere buffers ready for upload

use cgmath::BaseFloat;

use crate::sphere::required_vertices;
use crate::strip::checked_index_count;
use crate::{
    build_strip_indices, component_count, generate_sphere, indices_per_strip, try_with_capacity,
    GeometryError, Result,
};

/// A generated sphere: positions, normals and strip indices.
///
/// Positions and normals are flat `[x, y, z, ...]` arrays. Indices form
/// `num_parts()` triangle strips of `indices_per_part()` entries each.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh<T> {
    radius: T,
    slices: u32,
    stacks: u32,
    vertices: Vec<T>,
    normals: Vec<T>,
    indices: Vec<u32>,
}

impl<T: BaseFloat> SphereMesh<T> {
    /// Allocate and fill every buffer for a sphere of `radius`.
    ///
    /// A degenerate tessellation (`slices == 0` or `stacks < 2`) yields an
    /// empty mesh rather than an error.
    pub fn new(radius: T, slices: u32, stacks: u32) -> Result<Self> {
        let n_vert = required_vertices(slices, stacks)?;
        let components = component_count(n_vert, slices, stacks)?;

        let mut vertices = try_with_capacity(components, "vertex")?;
        vertices.resize(components, T::zero());
        let mut normals = try_with_capacity(components, "normal")?;
        normals.resize(components, T::zero());
        generate_sphere(radius, slices, stacks, &mut vertices, &mut normals, n_vert)?;

        let num_indices = if n_vert == 0 {
            0
        } else {
            checked_index_count(slices, stacks)
                .ok_or(GeometryError::TooManySubdivisions { slices, stacks })?
        };
        let mut indices = try_with_capacity(num_indices, "index")?;
        indices.resize(num_indices, 0);
        build_strip_indices(&mut indices, slices, stacks, n_vert)?;

        Ok(Self {
            radius,
            slices,
            stacks,
            vertices,
            normals,
            indices,
        })
    }

    pub fn radius(&self) -> T {
        self.radius
    }

    pub fn slices(&self) -> u32 {
        self.slices
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn vertices(&self) -> &[T] {
        &self.vertices
    }

    pub fn normals(&self) -> &[T] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of strips, one per stack
    pub fn num_parts(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.stacks as usize
        }
    }

    pub fn indices_per_part(&self) -> usize {
        indices_per_strip(self.slices)
    }

    /// Iterate over the index strips from north to south
    pub fn strips(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.indices.chunks_exact(self.indices_per_part())
    }

    /// Iterate over `(position, normal)` pairs
    pub fn iter_vertices(&self) -> impl Iterator<Item = ([T; 3], [T; 3])> + '_ {
        self.vertices
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .map(|(v, n)| ([v[0], v[1], v[2]], [n[0], n[1], n[2]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index_count, vertex_count};

    #[test]
    fn test_sphere_mesh() {
        let mesh = SphereMesh::new(1.0f32, 16, 8).unwrap();
        assert_eq!(mesh.vertex_count(), 16 * 7 + 2);
        assert_eq!(mesh.vertices().len(), mesh.normals().len());
        assert_eq!(mesh.num_parts(), 8);
        assert_eq!(mesh.indices_per_part(), 34);
        assert_eq!(mesh.index_count(), 8 * 34);

        for &index in mesh.indices() {
            assert!((index as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn test_strips_iterator() {
        let mesh = SphereMesh::new(2.0f64, 6, 4).unwrap();
        let strips: Vec<&[u32]> = mesh.strips().collect();
        assert_eq!(strips.len(), mesh.num_parts());
        for strip in strips {
            assert_eq!(strip.len(), mesh.indices_per_part());
            assert_eq!(strip[..2], strip[strip.len() - 2..]);
        }
    }

    #[test]
    fn test_matches_buffer_functions() {
        let mesh = SphereMesh::new(0.5f32, 5, 3).unwrap();

        let n_vert = vertex_count(5, 3);
        let mut vertices = vec![0.0f32; 3 * n_vert];
        let mut normals = vec![0.0f32; 3 * n_vert];
        generate_sphere(0.5, 5, 3, &mut vertices, &mut normals, n_vert).unwrap();
        let mut indices = vec![0u32; index_count(5, 3)];
        build_strip_indices(&mut indices, 5, 3, n_vert).unwrap();

        assert_eq!(mesh.vertices(), &vertices[..]);
        assert_eq!(mesh.normals(), &normals[..]);
        assert_eq!(mesh.indices(), &indices[..]);
    }

    #[test]
    fn test_degenerate_mesh_is_empty() {
        let mesh = SphereMesh::new(1.0f32, 0, 10).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.num_parts(), 0);
        assert!(mesh.indices().is_empty());
        assert_eq!(mesh.strips().count(), 0);
    }

    #[test]
    fn test_iter_vertices() {
        let mesh = SphereMesh::new(4.0f32, 3, 2).unwrap();
        let pairs: Vec<_> = mesh.iter_vertices().collect();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0], ([0.0, 0.0, 4.0], [0.0, 0.0, 1.0]));
        assert_eq!(pairs[4], ([0.0, 0.0, -4.0], [0.0, 0.0, -1.0]));
    }

    #[test]
    fn test_huge_tessellation_is_an_error() {
        let err = SphereMesh::<f32>::new(1.0, u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::TooManySubdivisions { .. } | GeometryError::Allocation { .. }
        ));
    }

    #[test]
    fn test_invalid_radius() {
        let err = SphereMesh::new(-1.0f32, 8, 4).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidRadius));
    }
}
