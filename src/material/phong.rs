//! Phong material.

use crate::core::Id;
use crate::math::Color;
use bytemuck::{Pod, Zeroable};

/// Blinn-Phong shaded surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterial {
    id: Id,
    /// Diffuse color.
    pub color: Color,
    /// Specular highlight color.
    pub specular: Color,
    /// Specular exponent.
    pub shininess: f32,
    /// Light emitted regardless of lighting.
    pub emissive: Color,
    /// Opacity, used when `transparent` is set.
    pub opacity: f32,
    /// Alpha blend the surface.
    pub transparent: bool,
    /// Write to the depth buffer.
    pub depth_write: bool,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

impl PhongMaterial {
    /// Create a material with a diffuse color and three.js defaults.
    pub fn new(color: impl Into<Color>) -> Self {
        Self {
            id: Id::new(),
            color: color.into(),
            specular: Color::from_hex(0x111111),
            shininess: 30.0,
            emissive: Color::BLACK,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
        }
    }

    /// Builder-style depth write toggle.
    pub fn with_depth_write(mut self, depth_write: bool) -> Self {
        self.depth_write = depth_write;
        self
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Alpha actually applied when drawing.
    #[inline]
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// GPU representation.
    pub fn uniform(&self, receive_shadow: bool) -> PhongMaterialUniform {
        PhongMaterialUniform {
            color: self.color.to_vec4(self.effective_opacity()).to_array(),
            specular: self.specular.to_rgba(self.shininess),
            emissive: self.emissive.to_rgba(if receive_shadow { 1.0 } else { 0.0 }),
        }
    }
}

/// Material uniform data.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PhongMaterialUniform {
    /// Diffuse RGB, alpha in w.
    pub color: [f32; 4],
    /// Specular RGB, shininess in w.
    pub specular: [f32; 4],
    /// Emissive RGB, receive-shadow flag in w.
    pub emissive: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_only_when_transparent() {
        let mut m = PhongMaterial::new(0x999999);
        m.opacity = 0.2;
        assert_eq!(m.effective_opacity(), 1.0);
        m.transparent = true;
        assert_eq!(m.effective_opacity(), 0.2);
    }

    #[test]
    fn test_uniform_packs_flags() {
        let m = PhongMaterial::new(0xffffff).with_depth_write(false);
        assert!(!m.depth_write);
        let u = m.uniform(true);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(u.specular[3], 30.0);
        assert_eq!(u.emissive[3], 1.0);
    }
}
