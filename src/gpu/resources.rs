//! Per-object GPU buffers and the uniform layouts they hold.

use crate::core::Id;
use crate::geometry::{BufferGeometry, ColorVertex, Vertex};
use crate::helpers::GridHelper;
use crate::material::PhongMaterialUniform;
use crate::math::{mat4_to_array, normal_matrix, Mat4};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// View-projection of the active camera (or the shadow light).
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CameraUniform {
    /// Clip-from-world matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Wrap a matrix.
    pub fn new(view_proj: &Mat4) -> Self {
        Self {
            view_proj: mat4_to_array(view_proj),
        }
    }
}

/// Placement and material of one mesh draw.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ModelUniform {
    /// World-from-local matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal: [[f32; 4]; 4],
    /// Surface parameters.
    pub material: PhongMaterialUniform,
}

impl ModelUniform {
    /// Build from a world matrix and packed material.
    pub fn new(world: &Mat4, material: PhongMaterialUniform) -> Self {
        Self {
            model: mat4_to_array(world),
            normal: mat4_to_array(&normal_matrix(world)),
            material,
        }
    }
}

/// Placement and tint of one line draw.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LineUniform {
    /// World-from-local matrix.
    pub model: [[f32; 4]; 4],
    /// Tint (rgb) and opacity (a).
    pub color: [f32; 4],
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str, data: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// GPU copy of a mesh node.
pub struct GpuMesh {
    geometry: Id,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    draw_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    /// Upload `geometry`; `vertices` may carry skinned positions.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        geometry: &BufferGeometry,
        vertices: &[Vertex],
        uniform: &ModelUniform,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = geometry.indices().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let uniform_buffer = uniform_buffer(device, "Mesh Uniform Buffer", uniform);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            geometry: geometry.id(),
            vertex_buffer,
            index_buffer,
            draw_count: geometry.index_count() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Geometry this mesh was built from.
    #[inline]
    pub fn geometry(&self) -> Id {
        self.geometry
    }

    /// Refresh the uniform and, for skinned meshes, the vertices.
    pub fn update(&self, queue: &wgpu::Queue, uniform: &ModelUniform, vertices: Option<&[Vertex]>) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
        if let Some(vertices) = vertices {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
    }

    /// Bind and draw. The pipeline and frame bind group must be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.draw_count, 0, 0..1);
            }
            None => pass.draw(0..self.draw_count, 0..1),
        }
    }
}

/// GPU copy of a grid helper.
pub struct GpuLines {
    helper: Id,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuLines {
    /// Upload the grid's line list.
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, grid: &GridHelper, uniform: &LineUniform) -> Self {
        let vertices: &[ColorVertex] = grid.vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform_buffer = uniform_buffer(device, "Grid Uniform Buffer", uniform);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Grid Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            helper: grid.id(),
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Helper this buffer was built from.
    #[inline]
    pub fn helper(&self) -> Id {
        self.helper
    }

    /// Refresh placement and tint.
    pub fn update(&self, queue: &wgpu::Queue, uniform: &LineUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    /// Bind and draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PhongMaterial;

    #[test]
    fn test_uniform_sizes_match_shaders() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 176);
        assert_eq!(std::mem::size_of::<LineUniform>(), 80);
    }

    #[test]
    fn test_model_uniform_normal_matrix() {
        let world = Mat4::from_scale(crate::math::Vec3::new(2.0, 2.0, 2.0));
        let u = ModelUniform::new(&world, PhongMaterial::default().uniform(false));
        assert_eq!(u.model[0][0], 2.0);
        assert_eq!(u.normal[0][0], 0.5);
    }
}
