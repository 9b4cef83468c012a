//! Uploads the generated sphere to the GPU

use anyhow::Context;
use geometry::SphereMesh;
use std::f32::consts::PI;
use wgpu::util::DeviceExt;

use crate::config::Tessellation;
use crate::draw::SolidGeometry;

/// Sphere buffers resident on the GPU
pub struct GpuSphere {
    vertex_buffer: wgpu::Buffer,
    normal_buffer: wgpu::Buffer,
    texcoord_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_vertices: u32,
    num_parts: u32,
    indices_per_part: u32,
    tessellation: Tessellation,
}

impl GpuSphere {
    /// Generate a sphere and upload it
    pub fn new(device: &wgpu::Device, radius: f32, tessellation: Tessellation) -> anyhow::Result<Self> {
        let mesh = SphereMesh::new(radius, tessellation.slices, tessellation.stacks)
            .with_context(|| {
                format!(
                    "failed to generate sphere with {} slices and {} stacks",
                    tessellation.slices, tessellation.stacks
                )
            })?;
        Self::upload(device, &mesh)
    }

    pub fn upload(device: &wgpu::Device, mesh: &SphereMesh<f32>) -> anyhow::Result<Self> {
        let num_vertices = u32::try_from(mesh.vertex_count()).context("too many vertices")?;
        let num_parts = u32::try_from(mesh.num_parts()).context("too many strips")?;
        let indices_per_part =
            u32::try_from(mesh.indices_per_part()).context("too many indices per strip")?;
        let texcoords = spherical_texcoords(mesh.normals());

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Normal Buffer"),
            contents: bytemuck::cast_slice(mesh.normals()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let texcoord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Texcoord Buffer"),
            contents: bytemuck::cast_slice(&texcoords),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!(
            "uploaded sphere: {} slices x {} stacks, {} vertices, {} strips of {} indices",
            mesh.slices(),
            mesh.stacks(),
            num_vertices,
            num_parts,
            indices_per_part
        );

        Ok(Self {
            vertex_buffer,
            normal_buffer,
            texcoord_buffer,
            index_buffer,
            num_vertices,
            num_parts,
            indices_per_part,
            tessellation: Tessellation {
                slices: mesh.slices(),
                stacks: mesh.stacks(),
            },
        })
    }

    pub fn tessellation(&self) -> Tessellation {
        self.tessellation
    }

    /// Describe the buffers for the draw dispatcher
    pub fn solid_geometry(&self, textured: bool) -> SolidGeometry<'_> {
        SolidGeometry {
            vertices: &self.vertex_buffer,
            normals: &self.normal_buffer,
            texcoords: textured.then_some(&self.texcoord_buffer),
            num_vertices: self.num_vertices,
            indices: Some(&self.index_buffer),
            num_parts: self.num_parts,
            num_indices_per_part: self.indices_per_part,
        }
    }
}

/// Texture coordinates from unit normals: `u` follows longitude, `v`
/// runs from 0 at the north pole to 1 at the south pole.
pub fn spherical_texcoords(normals: &[f32]) -> Vec<f32> {
    let mut texcoords = Vec::with_capacity(normals.len() / 3 * 2);
    for normal in normals.chunks_exact(3) {
        let u = normal[1].atan2(normal[0]).rem_euclid(2.0 * PI) / (2.0 * PI);
        let v = normal[2].clamp(-1.0, 1.0).acos() / PI;
        texcoords.extend_from_slice(&[u, v]);
    }
    texcoords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texcoords_at_poles() {
        let mesh = SphereMesh::new(2.0f32, 8, 4).unwrap();
        let texcoords = spherical_texcoords(mesh.normals());
        assert_eq!(texcoords.len(), mesh.vertex_count() * 2);

        assert_eq!(texcoords[1], 0.0);
        assert!((texcoords[texcoords.len() - 1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_texcoords_in_range() {
        let mesh = SphereMesh::new(1.0f32, 16, 9).unwrap();
        for uv in spherical_texcoords(mesh.normals()).chunks_exact(2) {
            assert!((0.0..=1.0).contains(&uv[0]));
            assert!((0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn test_equator_texcoords() {
        let texcoords = spherical_texcoords(&[1.0, 0.0, 0.0, 0.0, -1.0, 0.0]);
        assert!((texcoords[0] - 0.0).abs() < 1e-6);
        assert!((texcoords[1] - 0.5).abs() < 1e-6);
        assert!((texcoords[2] - 0.75).abs() < 1e-6);
        assert!((texcoords[3] - 0.5).abs() < 1e-6);
    }
}
