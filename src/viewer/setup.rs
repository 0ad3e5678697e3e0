//! Construction of the stock scene, camera and controls.

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::geometry::PlaneGeometry;
use crate::helpers::GridHelper;
use crate::light::{AmbientLight, DirectionalLight, HemisphereLight};
use crate::material::PhongMaterial;
use crate::math::Vec3;
use crate::objects::Mesh;
use crate::scene::{Node, Scene};
use std::f32::consts::FRAC_PI_2;

/// Name of the ground plane node.
pub const GROUND_NAME: &str = "ground";
/// Name of the grid node.
pub const GRID_NAME: &str = "grid";

/// Build the studio: background, fog, then ambient, hemisphere and
/// directional lights, the ground plane and the grid, in that order.
pub fn build_scene(config: &ViewerConfig) -> Scene {
    let mut scene = Scene::new();
    scene.set_background_color(config.scene.background);
    scene.set_fog(config.scene.fog);

    let ambient = &config.lights.ambient;
    scene.add(Node::light(
        "ambient",
        AmbientLight::new(ambient.color, ambient.intensity).into(),
    ));

    let hemi = &config.lights.hemisphere;
    let [x, y, z] = hemi.position;
    scene.add(
        Node::light(
            "hemisphere",
            HemisphereLight::new(hemi.sky_color, hemi.ground_color, hemi.intensity).into(),
        )
        .with_position(x, y, z),
    );

    let dir = &config.lights.directional;
    let [x, y, z] = dir.position;
    let mut sun = Node::light(
        "directional",
        DirectionalLight::new(dir.color, dir.intensity)
            .with_shadow(dir.shadow)
            .into(),
    )
    .with_position(x, y, z);
    sun.cast_shadow = dir.cast_shadow;
    scene.add(sun);

    let ground_config = &config.ground;
    let plane = PlaneGeometry::new(ground_config.size, ground_config.size).build();
    let material = PhongMaterial::new(ground_config.color).with_depth_write(ground_config.depth_write);
    let mut ground = Node::mesh(GROUND_NAME, Mesh::new(plane, material));
    ground.transform_mut().rotate_x(-FRAC_PI_2);
    ground.receive_shadow = ground_config.receive_shadow;
    scene.add(ground);

    let grid_config = &config.grid;
    let grid = GridHelper::new(
        grid_config.size,
        grid_config.divisions,
        grid_config.center_color,
        grid_config.line_color,
    )
    .with_opacity(grid_config.opacity);
    scene.add(Node::grid(GRID_NAME, grid));

    scene
}

/// Build the perspective camera for a canvas aspect ratio.
pub fn build_camera(config: &ViewerConfig, aspect: f32) -> PerspectiveCamera {
    let camera_config = &config.camera;
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let mut camera = PerspectiveCamera::new(camera_config.fov, aspect, camera_config.near, camera_config.far);
    let [x, y, z] = camera_config.position;
    camera.set_position(x, y, z);
    camera
}

/// Build orbit controls around the configured target and apply them once.
pub fn build_controls(config: &ViewerConfig, camera: &mut PerspectiveCamera) -> OrbitControls {
    let mut controls = OrbitControls::with_target(Vec3::from(config.camera.target));
    controls.update(camera);
    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use crate::scene::{Background, Fog, NodeKind};

    #[test]
    fn test_scene_children_in_order() {
        let scene = build_scene(&ViewerConfig::default());
        let kinds: Vec<&str> = scene
            .children()
            .iter()
            .map(|node| match node.kind() {
                NodeKind::Light(Light::Ambient(_)) => "ambient",
                NodeKind::Light(Light::Hemisphere(_)) => "hemisphere",
                NodeKind::Light(Light::Directional(_)) => "directional",
                NodeKind::Mesh(_) => "ground",
                NodeKind::Grid(_) => "grid",
                NodeKind::Group => "group",
            })
            .collect();
        assert_eq!(kinds, ["ambient", "hemisphere", "directional", "ground", "grid"]);
    }

    #[test]
    fn test_background_and_fog() {
        let scene = build_scene(&ViewerConfig::default());
        assert!(matches!(scene.background(), Background::Color(c) if c.to_hex() == 0xa0a0a0));
        assert!(matches!(scene.fog(), Fog::Linear { near, far, .. } if *near == 200.0 && *far == 1000.0));
    }

    #[test]
    fn test_lights_placed_and_shadowed() {
        let scene = build_scene(&ViewerConfig::default());
        let hemi = scene.find_by_name("hemisphere").unwrap();
        assert_eq!(hemi.position(), Vec3::new(0.0, 200.0, 0.0));
        let sun = scene.find_by_name("directional").unwrap();
        assert_eq!(sun.position(), Vec3::new(0.0, 200.0, 100.0));
        assert!(sun.cast_shadow);
        let Some(Light::Directional(light)) = sun.as_light() else {
            panic!("expected a directional light");
        };
        assert_eq!(light.shadow.camera.top, 180.0);
        assert_eq!(light.shadow.camera.bottom, -100.0);
        assert_eq!(light.shadow.camera.left, -120.0);
        assert_eq!(light.shadow.camera.right, 120.0);
        assert!(scene.has_shadow_caster());
    }

    #[test]
    fn test_ground_lies_flat_and_receives_shadow() {
        let scene = build_scene(&ViewerConfig::default());
        let ground = scene.find_by_name(GROUND_NAME).unwrap();
        assert!(ground.receive_shadow);
        assert!(!ground.cast_shadow);
        let mesh = ground.as_mesh().unwrap();
        assert!(!mesh.material.depth_write);
        assert_eq!(mesh.material.color.to_hex(), 0x999999);

        // The plane's +Z normal now points up.
        let up = ground.local_matrix().transform_vector3(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_grid_is_translucent() {
        let scene = build_scene(&ViewerConfig::default());
        let grid = scene.find_by_name(GRID_NAME).unwrap();
        let NodeKind::Grid(grid) = grid.kind() else {
            panic!("expected a grid");
        };
        assert_eq!(grid.divisions(), 20);
        assert!(grid.material.transparent);
        assert_eq!(grid.material.opacity, 0.2);
    }

    #[test]
    fn test_camera_and_controls() {
        let config = ViewerConfig::default();
        let mut camera = build_camera(&config, 2.0);
        assert_eq!(camera.fov, 45.0);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 2000.0);
        assert_eq!(camera.aspect, 2.0);

        let controls = build_controls(&config, &mut camera);
        assert_eq!(controls.target, Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(camera.target, controls.target);
        assert!((camera.position - Vec3::new(100.0, 200.0, 300.0)).length() < 1e-2);
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let camera = build_camera(&ViewerConfig::default(), f32::NAN);
        assert_eq!(camera.aspect, 1.0);
    }
}
