//! Forward renderer on wgpu.

use super::pipelines::{PipelineKey, Pipelines};
use super::resources::{CameraUniform, GpuLines, GpuMesh, LineUniform, ModelUniform};
use super::shadow::{create_shadow_sampler, ShadowMap, ShadowPass};
use crate::animation::skin_vertices;
use crate::camera::PerspectiveCamera;
use crate::core::{Context, Id, RenderBackend, RenderConfig, RenderError, RenderInfo};
use crate::light::LightsUniform;
use crate::math::{mat4_to_array, Color};
use crate::scene::{Background, NodeKind, Scene};
use std::collections::{HashMap, HashSet};

/// One queued draw.
#[derive(Debug, Clone, Copy)]
struct DrawItem {
    node: Id,
    lines: bool,
    key: PipelineKey,
    cast_shadow: bool,
    /// Squared distance to the eye, for sorting blended draws.
    depth: f32,
}

/// wgpu forward renderer: one optional shadow pass, then opaque draws in
/// scene order and blended draws back to front.
pub struct GpuRenderer {
    context: Context,
    pipelines: Pipelines,
    shadow_pass: ShadowPass,
    shadow_map: ShadowMap,
    shadow_sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    meshes: HashMap<Id, GpuMesh>,
    lines: HashMap<Id, GpuLines>,
    width: u32,
    height: u32,
    pixel_ratio: f64,
    shadow_map_enabled: bool,
    info: RenderInfo,
}

impl GpuRenderer {
    /// Create a renderer drawing into `context`'s surface.
    ///
    /// `width` and `height` are logical pixels.
    pub fn new(context: Context, width: u32, height: u32, pixel_ratio: f64, config: &RenderConfig) -> Self {
        let device = &context.device;
        let pipelines = Pipelines::new(device, context.surface_format, context.depth_format, context.sample_count);
        let shadow_pass = ShadowPass::new(device, &pipelines.model_layout);
        let shadow_map = ShadowMap::new(device, 512);
        let shadow_sampler = create_shadow_sampler(device);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lights Buffer"),
            size: std::mem::size_of::<LightsUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = create_frame_bind_group(
            device,
            &pipelines.frame_layout,
            &camera_buffer,
            &lights_buffer,
            &shadow_map,
            &shadow_sampler,
        );
        let depth_view = context.create_depth_view();
        let msaa_view = context.create_msaa_view();

        let mut renderer = Self {
            context,
            pipelines,
            shadow_pass,
            shadow_map,
            shadow_sampler,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            depth_view,
            msaa_view,
            meshes: HashMap::new(),
            lines: HashMap::new(),
            width,
            height,
            pixel_ratio: config.pixel_ratio.unwrap_or(pixel_ratio).max(f64::MIN_POSITIVE),
            shadow_map_enabled: config.shadow_map_enabled,
            info: RenderInfo::default(),
        };
        renderer.apply_size();
        renderer
    }

    /// The GPU context.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Number of GPU meshes currently cached.
    #[inline]
    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    fn apply_size(&mut self) {
        let (width, height) = self.drawing_buffer_size();
        if self.context.resize(width, height) {
            self.depth_view = self.context.create_depth_view();
            self.msaa_view = self.context.create_msaa_view();
        }
    }

    fn rebuild_frame_bind_group(&mut self) {
        self.frame_bind_group = create_frame_bind_group(
            &self.context.device,
            &self.pipelines.frame_layout,
            &self.camera_buffer,
            &self.lights_buffer,
            &self.shadow_map,
            &self.shadow_sampler,
        );
    }

    /// Upload or refresh GPU copies of everything visible and return the
    /// draw list. Cache entries of nodes no longer drawn are dropped.
    fn prepare(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Vec<DrawItem> {
        let device = &self.context.device;
        let queue = &self.context.queue;
        let pipelines = &self.pipelines;
        let meshes = &mut self.meshes;
        let lines = &mut self.lines;

        let worlds = scene.world_matrices();
        let eye = camera.position;
        let mut draws = Vec::new();
        let mut seen = HashSet::new();

        scene.visit_world(|node, world| {
            let depth = world.w_axis.truncate().distance_squared(eye);
            match node.kind() {
                NodeKind::Mesh(mesh) => {
                    let geometry = mesh.geometry();
                    if geometry.vertex_count() == 0 {
                        return;
                    }
                    let uniform = ModelUniform::new(world, mesh.material.uniform(node.receive_shadow));
                    let skinned = mesh.skin().filter(|_| mesh.is_skinned()).map(|skin| {
                        let joints = skin.joint_matrices(&worlds, world);
                        let (positions, normals) = skin_vertices(geometry, &joints);
                        geometry.interleave(Some(&positions), Some(&normals))
                    });

                    match meshes.get(&node.id()) {
                        Some(gpu) if gpu.geometry() == geometry.id() => {
                            gpu.update(queue, &uniform, skinned.as_deref());
                        }
                        _ => {
                            let vertices = skinned.unwrap_or_else(|| geometry.interleave(None, None));
                            let gpu = GpuMesh::new(device, &pipelines.model_layout, geometry, &vertices, &uniform);
                            meshes.insert(node.id(), gpu);
                        }
                    }

                    seen.insert(node.id());
                    draws.push(DrawItem {
                        node: node.id(),
                        lines: false,
                        key: PipelineKey {
                            blend: mesh.material.transparent,
                            depth_write: mesh.material.depth_write,
                        },
                        cast_shadow: node.cast_shadow,
                        depth,
                    });
                }
                NodeKind::Grid(grid) => {
                    let uniform = LineUniform {
                        model: mat4_to_array(world),
                        color: grid.material.color.to_rgba(grid.material.effective_opacity()),
                    };
                    match lines.get(&node.id()) {
                        Some(gpu) if gpu.helper() == grid.id() => gpu.update(queue, &uniform),
                        _ => {
                            let gpu = GpuLines::new(device, &pipelines.line_layout, grid, &uniform);
                            lines.insert(node.id(), gpu);
                        }
                    }

                    seen.insert(node.id());
                    draws.push(DrawItem {
                        node: node.id(),
                        lines: true,
                        key: PipelineKey {
                            blend: grid.material.transparent,
                            depth_write: grid.material.depth_write,
                        },
                        cast_shadow: false,
                        depth,
                    });
                }
                NodeKind::Group | NodeKind::Light(_) => {}
            }
        });

        meshes.retain(|id, _| seen.contains(id));
        lines.retain(|id, _| seen.contains(id));

        // Opaque in scene order, then blended back to front.
        draws.sort_by(|a, b| match (a.key.blend, b.key.blend) {
            (false, false) => std::cmp::Ordering::Equal,
            (true, true) => b.depth.total_cmp(&a.depth),
            (blend_a, blend_b) => blend_a.cmp(&blend_b),
        });
        draws
    }
}

fn create_frame_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    camera: &wgpu::Buffer,
    lights: &wgpu::Buffer,
    shadow_map: &ShadowMap,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Frame Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: lights.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(shadow_map.view()),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn clear_color(background: &Background) -> wgpu::Color {
    match background {
        Background::Color(color) => {
            let Color { r, g, b } = color.to_linear();
            wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            }
        }
        Background::None => wgpu::Color::BLACK,
    }
}

impl RenderBackend for GpuRenderer {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio > 0.0 && ratio.is_finite() {
            self.pixel_ratio = ratio;
            self.apply_size();
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.apply_size();
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.shadow_map_enabled = enabled;
    }

    fn shadow_map_enabled(&self) -> bool {
        self.shadow_map_enabled
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.info.begin_frame();
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }

        let (mut lights, caster) = LightsUniform::collect(scene, self.shadow_map_enabled);
        lights.set_camera_position(camera.position);
        if let Some(caster) = &caster {
            if self.shadow_map.resize(&self.context.device, caster.map_size) {
                self.rebuild_frame_bind_group();
            }
        }

        let queue = &self.context.queue;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::new(&camera.view_projection_matrix())),
        );
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&lights));

        let draws = self.prepare(scene, camera);

        let frame = match self.context.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                let err = RenderError::from(err);
                if err == RenderError::SurfaceLost {
                    log::debug!("Surface lost, reconfiguring");
                    self.context.reconfigure();
                }
                return Err(err);
            }
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_command_encoder();

        if let Some(caster) = &caster {
            self.shadow_pass.set_light_matrix(&self.context.queue, &caster.matrix);
            let mut pass = self.shadow_pass.begin(&mut encoder, &self.shadow_map);
            for draw in draws.iter().filter(|d| d.cast_shadow && !d.lines) {
                if let Some(mesh) = self.meshes.get(&draw.node) {
                    mesh.draw(&mut pass);
                }
            }
            self.info.shadow_pass = true;
        }

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(scene.background())),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for draw in &draws {
                if draw.lines {
                    if let Some(lines) = self.lines.get(&draw.node) {
                        pass.set_pipeline(self.pipelines.line(draw.key));
                        lines.draw(&mut pass);
                    }
                } else if let Some(mesh) = self.meshes.get(&draw.node) {
                    pass.set_pipeline(self.pipelines.phong(draw.key));
                    mesh.draw(&mut pass);
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.info.count_scene(scene);
        Ok(())
    }

    fn info(&self) -> &RenderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_color_is_linear() {
        let c = clear_color(&Background::Color(Color::from_hex(0xa0a0a0)));
        assert!(c.r < 0.4 && c.r > 0.3);
        assert_eq!(clear_color(&Background::None), wgpu::Color::BLACK);
    }
}
