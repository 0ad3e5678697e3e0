//! glTF 2.0 loader.
//!
//! Turns a `.gltf`/`.glb` document into a node hierarchy with Phong meshes,
//! skeleton bindings and animation clips whose tracks are addressed by node
//! name (`"<node>.position"`, `"<node>.quaternion"`, `"<node>.scale"`).

use super::{LoadError, LoadedModel};
use crate::animation::{
    AnimationClip, InterpolationMode, QuaternionTrack, Skin, Track, TrackProperty, VectorTrack,
};
use crate::core::Id;
use crate::geometry::BufferGeometry;
use crate::material::PhongMaterial;
use crate::math::{Color, Mat4, Quat, Vec3};
use crate::objects::Mesh;
use crate::scene::{Node, NodeKind, Transform};
use std::sync::Arc;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;

/// glTF file loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfLoader;

/// Per-document state while instantiating the scene.
struct Builder<'a> {
    buffers: &'a [gltf::buffer::Data],
    /// Node ids and names, indexed by glTF node index.
    nodes: Vec<Option<(Id, String)>>,
    /// Mesh nodes awaiting their skin: (mesh node, glTF skin index).
    pending_skins: Vec<(Id, usize)>,
}

impl GltfLoader {
    /// Create a new glTF loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a model from glTF or GLB bytes. Buffers must be embedded
    /// (GLB binary chunk or data URIs).
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<LoadedModel, LoadError> {
        let stripped = strip_required_extensions(data);
        let (document, buffers, _images) = gltf::import_slice(stripped.as_deref().unwrap_or(data))?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(LoadError::NoScene)?;

        let mut builder = Builder {
            buffers: &buffers,
            nodes: vec![None; document.nodes().len()],
            pending_skins: Vec::new(),
        };

        let mut root = Node::group(scene.name().unwrap_or("Scene"));
        for node in scene.nodes() {
            let child = builder.build_node(&node)?;
            root.add(child);
        }
        builder.resolve_skins(&document, &mut root);

        let animations = document
            .animations()
            .map(|animation| Arc::new(builder.build_clip(&animation)))
            .collect::<Vec<_>>();

        let model = LoadedModel { root, animations };
        log::info!(
            "Loaded glTF: {} nodes, {} meshes, {} animations",
            model.root.count(),
            model.mesh_count(),
            model.animations.len()
        );
        Ok(model)
    }
}

impl Builder<'_> {
    fn build_node(&mut self, node: &gltf::Node) -> Result<Node, LoadError> {
        let index = node.index();
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("node_{index}"));

        let mut out = Node::group(name.clone());
        let (translation, rotation, scale) = node.transform().decomposed();
        *out.transform_mut() = Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        };

        if let Some(mesh) = node.mesh() {
            let mut meshes = mesh
                .primitives()
                .filter(|p| p.mode() == gltf::mesh::Mode::Triangles)
                .map(|p| self.build_primitive(mesh.index(), &p))
                .collect::<Result<Vec<_>, _>>()?;

            if meshes.len() == 1 {
                if let Some(single) = meshes.pop() {
                    *out.kind_mut() = NodeKind::Mesh(single);
                }
                if let Some(skin) = node.skin() {
                    self.pending_skins.push((out.id(), skin.index()));
                }
            } else {
                for (i, primitive) in meshes.into_iter().enumerate() {
                    let child = Node::mesh(format!("{name}_primitive{i}"), primitive);
                    let child_id = out.add(child);
                    if let Some(skin) = node.skin() {
                        self.pending_skins.push((child_id, skin.index()));
                    }
                }
            }
        }

        self.nodes[index] = Some((out.id(), name));

        for child in node.children() {
            let child = self.build_node(&child)?;
            out.add(child);
        }
        Ok(out)
    }

    fn build_primitive(&self, mesh: usize, primitive: &gltf::Primitive) -> Result<Mesh, LoadError> {
        let reader = primitive.reader(|b| self.buffers.get(b.index()).map(|d| &d.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(LoadError::MissingPositions {
                mesh,
                primitive: primitive.index(),
            })?
            .collect();

        let mut geometry = BufferGeometry::new(positions);
        if let Some(uvs) = reader.read_tex_coords(0) {
            geometry = geometry.with_uvs(uvs.into_f32().collect());
        }
        if let Some(indices) = reader.read_indices() {
            geometry = geometry.with_indices(indices.into_u32().collect());
        }
        if let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) {
            geometry = geometry.with_skin_attributes(joints.into_u16().collect(), weights.into_f32().collect());
        }
        match reader.read_normals() {
            Some(normals) => geometry = geometry.with_normals(normals.collect()),
            None => geometry.compute_vertex_normals(),
        }

        Ok(Mesh::new(geometry, material(&primitive.material())))
    }

    fn resolve_skins(&self, document: &gltf::Document, root: &mut Node) {
        for &(mesh_id, skin_index) in &self.pending_skins {
            let Some(skin) = document.skins().nth(skin_index) else {
                continue;
            };
            let joints: Vec<Option<Id>> = skin
                .joints()
                .map(|joint| self.nodes[joint.index()].as_ref().map(|(id, _)| *id))
                .collect();
            let inverse_bind_matrices: Vec<Mat4> = skin
                .reader(|b| self.buffers.get(b.index()).map(|d| &d.0[..]))
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_default();

            if let Some(mesh) = root.find_by_id_mut(mesh_id).and_then(Node::as_mesh_mut) {
                mesh.set_skin(Some(Skin::new(joints, inverse_bind_matrices)));
            }
        }
    }

    fn build_clip(&self, animation: &gltf::Animation) -> AnimationClip {
        use gltf::animation::util::ReadOutputs;

        let name = animation
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));
        let mut tracks = Vec::new();

        for channel in animation.channels() {
            let target = channel.target();
            let Some((_, node_name)) = self.nodes[target.node().index()].as_ref() else {
                continue;
            };
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let reader = channel.reader(|b| self.buffers.get(b.index()).map(|d| &d.0[..]));
            let Some(times) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = times.collect();

            let track = match reader.read_outputs() {
                Some(ReadOutputs::Translations(values)) => Track::Vector(VectorTrack::with_interpolation(
                    format!("{node_name}.{}", TrackProperty::Translation.as_str()),
                    times,
                    values.map(Vec3::from).collect(),
                    interpolation,
                )),
                Some(ReadOutputs::Scales(values)) => Track::Vector(VectorTrack::with_interpolation(
                    format!("{node_name}.{}", TrackProperty::Scale.as_str()),
                    times,
                    values.map(Vec3::from).collect(),
                    interpolation,
                )),
                Some(ReadOutputs::Rotations(values)) => Track::Quaternion(QuaternionTrack::with_interpolation(
                    format!("{node_name}.{}", TrackProperty::Rotation.as_str()),
                    times,
                    values.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                )),
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    log::debug!("Skipping morph target channel on {node_name}");
                    continue;
                }
                None => continue,
            };
            tracks.push(track);
        }

        AnimationClip::from_tracks(name, tracks)
    }
}

fn material(material: &gltf::Material) -> PhongMaterial {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let mut out = PhongMaterial::new(Color::new(r, g, b));
    out.emissive = Color::from(material.emissive_factor());
    if material.alpha_mode() == gltf::material::AlphaMode::Blend {
        out.transparent = true;
        out.opacity = a;
    }
    out
}

/// Remove `extensionsRequired` so documents that demand unsupported
/// extensions still load. Returns `None` when the data needs no change.
fn strip_required_extensions(data: &[u8]) -> Option<Vec<u8>> {
    if data.starts_with(GLB_MAGIC) {
        strip_extensions_from_glb(data)
    } else {
        strip_extensions_from_json(data)
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn strip_extensions_from_glb(data: &[u8]) -> Option<Vec<u8>> {
    // Header is magic, version, length; the JSON chunk follows.
    let json_length = read_u32(data, 12)? as usize;
    if read_u32(data, 16)? != CHUNK_JSON {
        return None;
    }
    let json_end = 20usize.checked_add(json_length)?;
    let json = strip_extensions_from_json(data.get(20..json_end)?)?;

    let padded = (json.len() + 3) & !3;
    let rest = &data[json_end..];
    let total = 12 + 8 + padded + rest.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&data[0..8]);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(padded as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    out.resize(20 + padded, b' ');
    out.extend_from_slice(rest);
    Some(out)
}

fn strip_extensions_from_json(data: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(data).ok()?;
    if !text.contains("extensionsRequired") {
        return None;
    }
    let mut json: serde_json::Value = serde_json::from_str(text).ok()?;
    json.as_object_mut()?.remove("extensionsRequired")?;
    log::warn!("Ignoring extensionsRequired in glTF document");
    serde_json::to_vec(&json).ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::animation::AnimationMixer;
    use serde_json::json;

    /// Pack a JSON document and binary buffer into a GLB container.
    pub(crate) fn glb(json: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
        let mut json = serde_json::to_vec(json).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// A triangle under an "Armature" group with a one-second clip moving
    /// the "Body" node from the origin to x = 10.
    pub(crate) fn animated_triangle() -> Vec<u8> {
        let mut bin = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        bin.extend(floats(&[0.0, 1.0]));
        bin.extend(floats(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]));

        let doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "name": "Scene", "nodes": [0] }],
            "nodes": [
                { "name": "Armature", "children": [1] },
                { "name": "Body", "mesh": 0 }
            ],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
            "animations": [{
                "name": "Dance",
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
                "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }]
            }],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
                  "min": [0.0], "max": [1.0] },
                { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 44, "byteLength": 24 }
            ],
            "buffers": [{ "byteLength": 68 }]
        });
        glb(&doc, &bin)
    }

    #[test]
    fn test_load_hierarchy_and_mesh() {
        let model = GltfLoader::new().load_from_bytes(&animated_triangle()).unwrap();
        assert_eq!(model.root.name(), "Scene");
        assert_eq!(model.mesh_count(), 1);

        let armature = &model.root.children()[0];
        assert_eq!(armature.name(), "Armature");
        let body = &armature.children()[0];
        let mesh = body.as_mesh().unwrap();
        assert_eq!(mesh.geometry().triangle_count(), 1);
        // Missing normals are computed.
        assert_eq!(mesh.geometry().normals()[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_load_animation_tracks_by_name() {
        let model = GltfLoader::new().load_from_bytes(&animated_triangle()).unwrap();
        assert_eq!(model.animations.len(), 1);
        let clip = &model.animations[0];
        assert_eq!(clip.name, "Dance");
        assert!((clip.duration() - 1.0).abs() < 1e-6);
        let track = clip.find_track("Body.position").unwrap();
        assert_eq!(track.binding(), Some(("Body", TrackProperty::Translation)));
    }

    #[test]
    fn test_loaded_clip_drives_node() {
        let mut model = GltfLoader::new().load_from_bytes(&animated_triangle()).unwrap();
        let mut mixer = AnimationMixer::new(model.root.id());
        mixer.clip_action(model.animations[0].clone()).play();
        mixer.update(0.5);
        mixer.apply(&mut model.root);

        let body = model.root.find_by_name("Body").unwrap();
        assert!((body.position().x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_required_extensions_are_stripped() {
        let bytes = animated_triangle();
        let mut doc: serde_json::Value = {
            let len = read_u32(&bytes, 12).unwrap() as usize;
            serde_json::from_slice(&bytes[20..20 + len]).unwrap()
        };
        doc["extensionsUsed"] = json!(["EXT_unsupported"]);
        doc["extensionsRequired"] = json!(["EXT_unsupported"]);
        let bin_start = 20 + read_u32(&bytes, 12).unwrap() as usize + 8;
        let tampered = glb(&doc, &bytes[bin_start..]);

        let stripped = strip_required_extensions(&tampered).unwrap();
        assert_eq!(read_u32(&stripped, 8).unwrap() as usize, stripped.len());
        assert!(GltfLoader::new().load_from_bytes(&tampered).is_ok());
    }

    #[test]
    fn test_untouched_when_no_required_extensions() {
        assert!(strip_required_extensions(&animated_triangle()).is_none());
        assert!(strip_required_extensions(b"{\"asset\":{}}").is_none());
    }

    #[test]
    fn test_skin_joints_resolve_to_node_ids() {
        let mut bin = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        bin.extend([0u16, 0, 0, 0].repeat(3).iter().flat_map(|v| v.to_le_bytes()));
        bin.extend(floats(&[1.0, 0.0, 0.0, 0.0].repeat(3)));
        bin.extend(floats(&Mat4::IDENTITY.to_cols_array()));
        bin.extend(floats(&Mat4::from_translation(Vec3::X).to_cols_array()));

        let doc = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [
                { "name": "Armature", "children": [1, 2] },
                { "name": "Body", "mesh": 0, "skin": 0 },
                { "name": "Bone" },
                { "name": "Orphan" }
            ],
            "skins": [{ "joints": [3, 2], "inverseBindMatrices": 3 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 } }] }],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "VEC4" },
                { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC4" },
                { "bufferView": 3, "componentType": 5126, "count": 2, "type": "MAT4" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
                { "buffer": 0, "byteOffset": 60, "byteLength": 48 },
                { "buffer": 0, "byteOffset": 108, "byteLength": 128 }
            ],
            "buffers": [{ "byteLength": 236 }]
        });

        let model = GltfLoader::new().load_from_bytes(&glb(&doc, &bin)).unwrap();
        let bone = model.root.find_by_name("Bone").unwrap().id();
        let body = model.root.find_by_name("Body").unwrap().as_mesh().unwrap();
        assert!(body.is_skinned());
        // "Orphan" is not under the scene, so its slot is empty but kept.
        let skin = body.skin().unwrap();
        assert!(model.root.find_by_name("Orphan").is_none());
        assert_eq!(skin.joints(), &[None, Some(bone)]);
        assert_eq!(skin.inverse_bind_matrices()[0], Mat4::from_translation(Vec3::X));
        assert_eq!(skin.inverse_bind_matrices()[1], Mat4::IDENTITY);
    }

    #[test]
    fn test_oversized_json_chunk_length_rejected() {
        let mut bytes = animated_triangle();
        bytes[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(strip_extensions_from_glb(&bytes).is_none());
        assert!(GltfLoader::new().load_from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_invalid_bytes_fail() {
        let err = GltfLoader::new().load_from_bytes(b"not a model").unwrap_err();
        assert!(matches!(err, LoadError::Gltf(_)));
    }
}
