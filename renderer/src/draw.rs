//! Issues the draw calls for solid geometry held in GPU buffers.
//!
//! Positions, normals and texture coordinates live in separate vertex
//! buffers (slots 0, 1 and 2). Geometry without indices is drawn as a
//! plain triangle list; indexed geometry split into several parts is
//! drawn one triangle strip per part; a single indexed part is a
//! triangle list.

use std::ops::Range;

/// One draw call on the render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    /// Non-indexed triangle list over a vertex range
    Arrays { vertices: Range<u32> },
    /// Indexed triangle strip over an index range
    Strip { indices: Range<u32> },
    /// Indexed triangle list over an index range
    Triangles { indices: Range<u32> },
}

/// Work out which draw calls render the given geometry.
pub fn plan_draw_calls(
    num_vertices: u32,
    indexed: bool,
    num_parts: u32,
    num_indices_per_part: u32,
) -> Vec<DrawCall> {
    if num_vertices == 0 {
        return Vec::new();
    }

    if !indexed {
        return vec![DrawCall::Arrays {
            vertices: 0..num_vertices,
        }];
    }

    if num_parts > 1 {
        (0..num_parts)
            .map(|part| {
                let start = part * num_indices_per_part;
                DrawCall::Strip {
                    indices: start..start + num_indices_per_part,
                }
            })
            .collect()
    } else {
        vec![DrawCall::Triangles {
            indices: 0..num_indices_per_part,
        }]
    }
}

/// Buffers describing one solid object
pub struct SolidGeometry<'a> {
    pub vertices: &'a wgpu::Buffer,
    pub normals: &'a wgpu::Buffer,
    pub texcoords: Option<&'a wgpu::Buffer>,
    pub num_vertices: u32,
    pub indices: Option<&'a wgpu::Buffer>,
    pub num_parts: u32,
    pub num_indices_per_part: u32,
}

impl SolidGeometry<'_> {
    pub fn plan(&self) -> Vec<DrawCall> {
        plan_draw_calls(
            self.num_vertices,
            self.indices.is_some(),
            self.num_parts,
            self.num_indices_per_part,
        )
    }
}

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn texcoord_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}

/// Render pipelines for every (topology, textured) combination
pub struct SolidPipelines {
    list: wgpu::RenderPipeline,
    strip: wgpu::RenderPipeline,
    list_textured: wgpu::RenderPipeline,
    strip_textured: wgpu::RenderPipeline,
}

impl SolidPipelines {
    /// Build the pipelines from a shader exposing `vs_main`/`fs_main` and
    /// `vs_textured`/`fs_textured`.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> Self {
        let build = |label: &str, topology: wgpu::PrimitiveTopology, textured: bool| {
            let untextured_buffers = [position_layout(), normal_layout()];
            let textured_buffers = [position_layout(), normal_layout(), texcoord_layout()];
            let (vertex_entry, fragment_entry, buffers): (&str, &str, &[wgpu::VertexBufferLayout]) =
                if textured {
                    ("vs_textured", "fs_textured", &textured_buffers)
                } else {
                    ("vs_main", "fs_main", &untextured_buffers)
                };
            let strip_index_format = match topology {
                wgpu::PrimitiveTopology::TriangleStrip => Some(wgpu::IndexFormat::Uint32),
                _ => None,
            };

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: vertex_entry,
                    buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: fragment_entry,
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
        };

        Self {
            list: build("Solid List Pipeline", wgpu::PrimitiveTopology::TriangleList, false),
            strip: build("Solid Strip Pipeline", wgpu::PrimitiveTopology::TriangleStrip, false),
            list_textured: build(
                "Textured List Pipeline",
                wgpu::PrimitiveTopology::TriangleList,
                true,
            ),
            strip_textured: build(
                "Textured Strip Pipeline",
                wgpu::PrimitiveTopology::TriangleStrip,
                true,
            ),
        }
    }

    fn select(&self, strip: bool, textured: bool) -> &wgpu::RenderPipeline {
        match (strip, textured) {
            (false, false) => &self.list,
            (true, false) => &self.strip,
            (false, true) => &self.list_textured,
            (true, true) => &self.strip_textured,
        }
    }
}

/// Record the draw calls for `geometry` into `pass`.
///
/// The caller binds everything else the pipelines need (the camera bind
/// group at index 0).
pub fn draw_solid<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    pipelines: &'a SolidPipelines,
    geometry: &SolidGeometry<'a>,
) {
    let calls = geometry.plan();
    if calls.is_empty() {
        return;
    }

    pass.set_vertex_buffer(0, geometry.vertices.slice(..));
    pass.set_vertex_buffer(1, geometry.normals.slice(..));
    let textured = match geometry.texcoords {
        Some(texcoords) => {
            pass.set_vertex_buffer(2, texcoords.slice(..));
            true
        }
        None => false,
    };
    if let Some(indices) = geometry.indices {
        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
    }

    let mut bound_strip = None;
    for call in calls {
        let strip = matches!(call, DrawCall::Strip { .. });
        if bound_strip != Some(strip) {
            pass.set_pipeline(pipelines.select(strip, textured));
            bound_strip = Some(strip);
        }

        match call {
            DrawCall::Arrays { vertices } => pass.draw(vertices, 0..1),
            DrawCall::Strip { indices } | DrawCall::Triangles { indices } => {
                pass.draw_indexed(indices, 0, 0..1)
            }
        }
    }

    log::trace!(
        "drew {} vertices in {} part(s)",
        geometry.num_vertices,
        geometry.num_parts.max(1)
    );
}
