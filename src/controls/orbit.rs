//! Orbit controls for rotating camera around a target.

use crate::camera::PerspectiveCamera;
use crate::math::{Vec2, Vec3, UP};
use std::f32::consts::PI;

const EPS: f32 = 1e-6;

/// Mouse button that started a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button.
    Primary,
    /// Middle button.
    Auxiliary,
    /// Right button.
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            1 => Some(Self::Auxiliary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Spherical offset delta accumulated between updates.
#[derive(Debug, Clone, Copy, Default)]
struct SphericalDelta {
    /// Azimuthal angle (around Y).
    theta: f32,
    /// Polar angle (from +Y).
    phi: f32,
}

/// Orbit controls allowing camera rotation around a target point.
///
/// Input handlers only accumulate deltas; [`OrbitControls::update`] applies
/// them to the camera.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Target point to orbit around.
    pub target: Vec3,
    /// Minimum distance from target.
    pub min_distance: f32,
    /// Maximum distance from target.
    pub max_distance: f32,
    /// Minimum polar angle (radians, 0 = top).
    pub min_polar_angle: f32,
    /// Maximum polar angle (radians, PI = bottom).
    pub max_polar_angle: f32,
    /// Enable rotation.
    pub enable_rotate: bool,
    /// Enable panning.
    pub enable_pan: bool,
    /// Enable zooming.
    pub enable_zoom: bool,
    /// Rotation speed multiplier.
    pub rotate_speed: f32,
    /// Pan speed multiplier.
    pub pan_speed: f32,
    /// Zoom speed multiplier.
    pub zoom_speed: f32,
    /// Enable damping (inertia).
    pub enable_damping: bool,
    /// Damping factor (0-1, lower = more inertia).
    pub damping_factor: f32,
    spherical_delta: SphericalDelta,
    pan_offset: Vec3,
    scale: f32,
    state: DragState,
    pointer: Vec2,
    element_size: Vec2,
    /// Pan drags need the camera; collected here until the next update.
    pending_pan: Vec2,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            enable_damping: false,
            damping_factor: 0.05,
            spherical_delta: SphericalDelta::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            state: DragState::None,
            pointer: Vec2::ZERO,
            element_size: Vec2::ONE,
            pending_pan: Vec2::ZERO,
        }
    }
}

impl OrbitControls {
    /// Create new orbit controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create orbit controls with a target.
    pub fn with_target(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Size of the element receiving input, in CSS pixels.
    pub fn set_element_size(&mut self, width: u32, height: u32) {
        self.element_size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Whether a drag is in progress.
    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.state != DragState::None
    }

    /// Start a drag. Primary rotates (pans with shift); secondary pans.
    pub fn pointer_down(&mut self, button: PointerButton, x: f32, y: f32, shift: bool) {
        self.state = match button {
            PointerButton::Primary if shift && self.enable_pan => DragState::Pan,
            PointerButton::Primary if self.enable_rotate => DragState::Rotate,
            PointerButton::Secondary if self.enable_pan => DragState::Pan,
            _ => DragState::None,
        };
        self.pointer = Vec2::new(x, y);
    }

    /// Continue a drag.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        let delta = position - self.pointer;
        self.pointer = position;

        match self.state {
            DragState::Rotate => {
                let h = self.element_size.y;
                self.rotate_left(2.0 * PI * delta.x / h * self.rotate_speed);
                self.rotate_up(2.0 * PI * delta.y / h * self.rotate_speed);
            }
            DragState::Pan => self.pending_pan += delta * self.pan_speed,
            DragState::None => {}
        }
    }

    /// End a drag.
    pub fn pointer_up(&mut self) {
        self.state = DragState::None;
    }

    /// Mouse wheel; negative `delta_y` (scroll up) moves closer.
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.enable_zoom || delta_y == 0.0 {
            return;
        }
        let zoom_scale = 0.95f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.dolly_in(zoom_scale);
        } else {
            self.dolly_out(zoom_scale);
        }
    }

    /// Rotate around the vertical axis (radians).
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Rotate towards the top pole (radians).
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Move the camera towards the target by a scale factor in (0, 1].
    pub fn dolly_in(&mut self, scale: f32) {
        if scale > 0.0 {
            self.scale *= scale;
        }
    }

    /// Move the camera away from the target by a scale factor in (0, 1].
    pub fn dolly_out(&mut self, scale: f32) {
        if scale > 0.0 {
            self.scale /= scale;
        }
    }

    /// Pan by a screen-space pixel delta.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, camera: &PerspectiveCamera) {
        if !self.enable_pan {
            return;
        }
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov.to_radians() / 2.0).tan();
        let h = self.element_size.y;

        let forward = (self.target - camera.position).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);

        self.pan_offset += right * (-2.0 * delta_x * target_distance / h);
        self.pan_offset += up * (2.0 * delta_y * target_distance / h);
    }

    /// Apply accumulated input to the camera. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.pending_pan != Vec2::ZERO {
            let pending = std::mem::take(&mut self.pending_pan);
            self.pan(pending.x, pending.y, camera);
        }

        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        if self.enable_damping {
            theta += self.spherical_delta.theta * self.damping_factor;
            phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            theta += self.spherical_delta.theta;
            phi += self.spherical_delta.phi;
        }

        let min_phi = self.min_polar_angle.max(EPS);
        let max_phi = self.max_polar_angle.min(PI - EPS);
        phi = phi.clamp(min_phi, max_phi.max(min_phi));

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );

        let old_position = camera.position;
        let old_target = camera.target;
        camera.position = self.target + new_offset;
        camera.up = UP;
        camera.look_at(self.target);

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = SphericalDelta::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(old_position) > EPS || camera.target != old_target
    }

    /// Drop any accumulated input and end drags.
    pub fn reset(&mut self) {
        self.spherical_delta = SphericalDelta::default();
        self.pan_offset = Vec3::ZERO;
        self.pending_pan = Vec2::ZERO;
        self.scale = 1.0;
        self.state = DragState::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 1.0, 2000.0);
        camera.set_position(100.0, 200.0, 300.0);
        camera
    }

    #[test]
    fn test_update_without_input_keeps_position() {
        let mut camera = camera();
        let mut controls = OrbitControls::with_target(Vec3::new(0.0, 100.0, 0.0));
        controls.update(&mut camera);
        assert!((camera.position - Vec3::new(100.0, 200.0, 300.0)).length() < 1e-3);
        assert_eq!(camera.target, Vec3::new(0.0, 100.0, 0.0));
    }

    #[test]
    fn test_drag_rotates_around_target() {
        let mut camera = camera();
        let mut controls = OrbitControls::with_target(Vec3::new(0.0, 100.0, 0.0));
        controls.set_element_size(800, 600);
        controls.update(&mut camera);
        let distance = camera.position.distance(controls.target);

        controls.pointer_down(PointerButton::Primary, 10.0, 10.0, false);
        controls.pointer_move(110.0, 10.0);
        controls.pointer_up();
        assert!(controls.update(&mut camera));
        assert!((camera.position.distance(controls.target) - distance).abs() < 1e-3);
        assert!(!controls.is_dragging());
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.position - controls.target;
        assert!(offset.y > 0.0);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn test_wheel_zoom_and_distance_clamp() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let start = camera.position.length();
        controls.wheel(-100.0);
        controls.update(&mut camera);
        assert!(camera.position.length() < start);

        controls.max_distance = 50.0;
        controls.update(&mut camera);
        assert!((camera.position.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_secondary_drag_pans_target() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        controls.set_element_size(800, 600);
        controls.pointer_down(PointerButton::Secondary, 0.0, 0.0, false);
        controls.pointer_move(50.0, 0.0);
        controls.update(&mut camera);
        assert_ne!(controls.target, Vec3::ZERO);
        assert_eq!(camera.target, controls.target);
    }

    #[test]
    fn test_dom_buttons() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(7), None);
    }
}
