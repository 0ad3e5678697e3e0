//! Bind group layouts and render pipelines of the forward renderer.

use crate::geometry::{ColorVertex, Vertex};

/// Phong surface shader.
const PHONG_SHADER: &str = include_str!("../shaders/phong.wgsl");
/// Vertex-colored line shader.
const LINE_SHADER: &str = include_str!("../shaders/line.wgsl");

/// Blend and depth-write state a draw needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Alpha blend over what is already drawn.
    pub blend: bool,
    /// Write to the depth buffer.
    pub depth_write: bool,
}

impl PipelineKey {
    /// Every combination, in index order.
    pub const ALL: [PipelineKey; 4] = [
        PipelineKey { blend: false, depth_write: false },
        PipelineKey { blend: false, depth_write: true },
        PipelineKey { blend: true, depth_write: false },
        PipelineKey { blend: true, depth_write: true },
    ];

    /// Slot of this key in [`PipelineKey::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        (self.blend as usize) * 2 + self.depth_write as usize
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layouts and pipelines, built once per surface format.
pub struct Pipelines {
    /// Group 0 of lit and line draws: camera, lights, shadow map, sampler.
    pub frame_layout: wgpu::BindGroupLayout,
    /// Group 1 of mesh draws (also used by the shadow pass).
    pub model_layout: wgpu::BindGroupLayout,
    /// Group 1 of line draws.
    pub line_layout: wgpu::BindGroupLayout,
    phong: Vec<wgpu::RenderPipeline>,
    line: Vec<wgpu::RenderPipeline>,
}

impl Pipelines {
    /// Build every pipeline variant.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let vertex_and_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, vertex_and_fragment),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Layout"),
            entries: &[uniform_entry(0, vertex_and_fragment)],
        });
        let line_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Line Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let phong_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(PHONG_SHADER.into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER.into()),
        });

        let phong_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phong Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let line_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &line_layout],
            push_constant_ranges: &[],
        });

        let targets = Targets {
            color_format,
            depth_format,
            sample_count,
        };
        let phong = PipelineKey::ALL
            .iter()
            .map(|key| {
                targets.build(
                    device,
                    "Phong Pipeline",
                    &phong_layout,
                    &phong_shader,
                    Vertex::layout(),
                    wgpu::PrimitiveTopology::TriangleList,
                    *key,
                )
            })
            .collect();
        let line = PipelineKey::ALL
            .iter()
            .map(|key| {
                targets.build(
                    device,
                    "Line Pipeline",
                    &line_pipeline_layout,
                    &line_shader,
                    ColorVertex::layout(),
                    wgpu::PrimitiveTopology::LineList,
                    *key,
                )
            })
            .collect();

        Self {
            frame_layout,
            model_layout,
            line_layout,
            phong,
            line,
        }
    }

    /// Lit mesh pipeline for a key.
    #[inline]
    pub fn phong(&self, key: PipelineKey) -> &wgpu::RenderPipeline {
        &self.phong[key.index()]
    }

    /// Line pipeline for a key.
    #[inline]
    pub fn line(&self, key: PipelineKey) -> &wgpu::RenderPipeline {
        &self.line[key.index()]
    }
}

/// Attachment formats shared by every pipeline of the main pass.
struct Targets {
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl Targets {
    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        vertex_layout: wgpu::VertexBufferLayout<'static>,
        topology: wgpu::PrimitiveTopology,
        key: PipelineKey,
    ) -> wgpu::RenderPipeline {
        let cull_mode = match topology {
            wgpu::PrimitiveTopology::TriangleList => Some(wgpu::Face::Back),
            _ => None,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(if key.blend {
                        wgpu::BlendState::ALPHA_BLENDING
                    } else {
                        wgpu::BlendState::REPLACE
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.depth_format,
                depth_write_enabled: key.depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_key_slots_are_unique() {
        for (i, key) in PipelineKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_shaders_declare_entry_points() {
        for source in [PHONG_SHADER, LINE_SHADER] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }
}
