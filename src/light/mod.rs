//! Lighting module for scene illumination.

mod ambient;
mod directional;
mod hemisphere;

pub use ambient::AmbientLight;
pub use directional::{DirectionalLight, DirectionalShadow};
pub use hemisphere::HemisphereLight;

use crate::math::{mat4_to_array, Mat4, Vec3};
use crate::scene::{Fog, Scene};
use bytemuck::{Pod, Zeroable};

/// Maximum number of directional lights supported in a single render pass.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// A light carried by a scene node. Positions come from the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform ambient term.
    Ambient(AmbientLight),
    /// Sky/ground gradient.
    Hemisphere(HemisphereLight),
    /// Parallel rays, optionally shadowed.
    Directional(DirectionalLight),
}

impl From<AmbientLight> for Light {
    fn from(light: AmbientLight) -> Self {
        Self::Ambient(light)
    }
}

impl From<HemisphereLight> for Light {
    fn from(light: HemisphereLight) -> Self {
        Self::Hemisphere(light)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Self::Directional(light)
    }
}

/// GPU-friendly directional light data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DirectionalLightUniform {
    /// Direction towards the light (xyz), shadowed flag (w).
    pub direction: [f32; 4],
    /// Color × intensity (rgb).
    pub color: [f32; 4],
}

/// Lights, fog and shadow parameters shared by every lit draw.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LightsUniform {
    /// Light-space view-projection of the shadow map.
    pub shadow_matrix: [[f32; 4]; 4],
    /// Ambient light color × intensity (rgb).
    pub ambient: [f32; 4],
    /// Hemisphere sky color × intensity (rgb), enabled flag (w).
    pub hemisphere_sky: [f32; 4],
    /// Hemisphere ground color × intensity (rgb).
    pub hemisphere_ground: [f32; 4],
    /// Hemisphere up direction (xyz).
    pub hemisphere_up: [f32; 4],
    /// Fog color (rgb), mode (w: 0 none, 1 linear, 2 exponential).
    pub fog_color: [f32; 4],
    /// Fog near, far, density.
    pub fog_params: [f32; 4],
    /// Camera world position (xyz).
    pub camera_position: [f32; 4],
    /// Shadow bias, texel size, enabled flag.
    pub shadow_params: [f32; 4],
    /// Number of active directional lights (x).
    pub counts: [u32; 4],
    /// Directional lights.
    pub directional: [DirectionalLightUniform; MAX_DIRECTIONAL_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self {
            shadow_matrix: mat4_to_array(&Mat4::IDENTITY),
            ambient: [0.0; 4],
            hemisphere_sky: [0.0; 4],
            hemisphere_ground: [0.0; 4],
            hemisphere_up: [0.0, 1.0, 0.0, 0.0],
            fog_color: [0.0; 4],
            fog_params: [0.0; 4],
            camera_position: [0.0; 4],
            shadow_params: [0.0; 4],
            counts: [0; 4],
            directional: [DirectionalLightUniform::default(); MAX_DIRECTIONAL_LIGHTS],
        }
    }
}

/// The directional light whose shadow map is rendered this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCaster {
    /// Light-space view-projection.
    pub matrix: Mat4,
    /// Shadow map resolution.
    pub map_size: u32,
    /// Depth bias.
    pub bias: f32,
}

impl LightsUniform {
    /// Create an unlit uniform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directional lights recorded.
    #[inline]
    pub fn directional_count(&self) -> usize {
        self.counts[0] as usize
    }

    /// Add an ambient light. Several ambients sum.
    pub fn add_ambient(&mut self, light: &AmbientLight) {
        let c = light.effective_color();
        self.ambient[0] += c.r;
        self.ambient[1] += c.g;
        self.ambient[2] += c.b;
    }

    /// Set the hemisphere light. Only one is used.
    pub fn set_hemisphere(&mut self, light: &HemisphereLight, up: Vec3) {
        let sky = light.sky_color.scaled(light.intensity);
        let ground = light.ground_color.scaled(light.intensity);
        self.hemisphere_sky = sky.to_rgba(1.0);
        self.hemisphere_ground = ground.to_rgba(0.0);
        let up = up.normalize_or_zero();
        let up = if up == Vec3::ZERO { Vec3::Y } else { up };
        self.hemisphere_up = up.extend(0.0).to_array();
    }

    /// Add a directional light placed at `position`. Returns its slot, or
    /// `None` when all slots are taken.
    pub fn add_directional(&mut self, light: &DirectionalLight, position: Vec3, shadowed: bool) -> Option<usize> {
        let index = self.directional_count();
        if index >= MAX_DIRECTIONAL_LIGHTS {
            return None;
        }
        let dir = light.direction_from(position);
        self.directional[index] = DirectionalLightUniform {
            direction: dir.extend(if shadowed { 1.0 } else { 0.0 }).to_array(),
            color: light.color.scaled(light.intensity).to_rgba(0.0),
        };
        self.counts[0] += 1;
        Some(index)
    }

    /// Enable sampling of a shadow map.
    pub fn set_shadow(&mut self, caster: &ShadowCaster) {
        self.shadow_matrix = mat4_to_array(&caster.matrix);
        self.shadow_params = [caster.bias, 1.0 / caster.map_size.max(1) as f32, 1.0, 0.0];
    }

    /// Set the fog parameters.
    pub fn set_fog(&mut self, fog: &Fog) {
        match *fog {
            Fog::None => {
                self.fog_color = [0.0; 4];
                self.fog_params = [0.0; 4];
            }
            Fog::Linear { color, near, far } => {
                self.fog_color = color.to_rgba(1.0);
                self.fog_params = [near, far, 0.0, 0.0];
            }
            Fog::Exponential { color, density } => {
                self.fog_color = color.to_rgba(2.0);
                self.fog_params = [0.0, 0.0, density, 0.0];
            }
        }
    }

    /// Set the eye position used for fog distance and specular.
    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position.extend(1.0).to_array();
    }

    /// Gather the lights and fog of a scene. The first visible shadow-casting
    /// directional light becomes the shadow caster when `shadows` is on.
    pub fn collect(scene: &Scene, shadows: bool) -> (Self, Option<ShadowCaster>) {
        let mut uniform = Self::new();
        let mut caster = None;
        let mut hemisphere_set = false;

        scene.visit_world(|node, world| {
            let Some(light) = node.as_light() else {
                return;
            };
            let position = world.w_axis.truncate();
            match light {
                Light::Ambient(ambient) => uniform.add_ambient(ambient),
                Light::Hemisphere(hemi) => {
                    if !hemisphere_set {
                        uniform.set_hemisphere(hemi, position);
                        hemisphere_set = true;
                    }
                }
                Light::Directional(dir) => {
                    let shadowed = shadows && node.cast_shadow && caster.is_none();
                    if uniform.add_directional(dir, position, shadowed).is_some() && shadowed {
                        caster = Some(ShadowCaster {
                            matrix: dir.shadow_matrix(position),
                            map_size: dir.shadow.map_size,
                            bias: dir.shadow.bias,
                        });
                    }
                }
            }
        });

        uniform.set_fog(scene.fog());
        if let Some(caster) = &caster {
            uniform.set_shadow(caster);
        }
        (uniform, caster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;
    use crate::scene::Node;

    #[test]
    fn test_uniform_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }

    #[test]
    fn test_ambient_lights_sum() {
        let mut u = LightsUniform::new();
        u.add_ambient(&AmbientLight::new(0x000099, 1.0));
        u.add_ambient(&AmbientLight::new(0x000099, 1.0));
        assert_eq!(u.ambient[2], Color::from_hex(0x000099).b * 2.0);
    }

    #[test]
    fn test_directional_slots_are_bounded() {
        let mut u = LightsUniform::new();
        let light = DirectionalLight::default();
        for _ in 0..MAX_DIRECTIONAL_LIGHTS {
            assert!(u.add_directional(&light, Vec3::Y, false).is_some());
        }
        assert!(u.add_directional(&light, Vec3::Y, false).is_none());
    }

    #[test]
    fn test_collect_scene_lights() {
        let mut scene = Scene::new();
        scene.set_fog(Fog::Linear {
            color: Color::from_hex(0xa0a0a0),
            near: 200.0,
            far: 1000.0,
        });
        scene.add(Node::light("ambient", AmbientLight::new(0x000099, 1.0).into()));
        scene.add(
            Node::light("hemi", HemisphereLight::new(0xffffff, 0x444444, 1.0).into())
                .with_position(0.0, 200.0, 0.0),
        );
        let mut sun = Node::light("sun", DirectionalLight::new(0xffffff, 1.0).into())
            .with_position(0.0, 200.0, 100.0);
        sun.cast_shadow = true;
        scene.add(sun);

        let (u, caster) = LightsUniform::collect(&scene, true);
        assert_eq!(u.directional_count(), 1);
        assert_eq!(u.hemisphere_up, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(u.fog_params[..2], [200.0, 1000.0]);
        assert_eq!(u.directional[0].direction[3], 1.0);
        assert!(caster.is_some());
        assert_eq!(u.shadow_params[2], 1.0);

        let (u, caster) = LightsUniform::collect(&scene, false);
        assert!(caster.is_none());
        assert_eq!(u.directional[0].direction[3], 0.0);
    }
}
