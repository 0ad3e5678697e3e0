//! Skeleton binding and CPU vertex skinning.

use crate::core::Id;
use crate::geometry::BufferGeometry;
use crate::math::Mat4;
use std::collections::HashMap;

/// Joints of a skinned mesh and their inverse bind matrices.
///
/// A joint slot is `None` when its node is not part of the scene; the slot
/// is kept so joint indices stay aligned with the inverse bind matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    joints: Vec<Option<Id>>,
    inverse_bind_matrices: Vec<Mat4>,
}

impl Skin {
    /// Create a skin. Missing inverse bind matrices default to identity.
    pub fn new(joints: Vec<Option<Id>>, mut inverse_bind_matrices: Vec<Mat4>) -> Self {
        inverse_bind_matrices.resize(joints.len(), Mat4::IDENTITY);
        Self {
            joints,
            inverse_bind_matrices,
        }
    }

    /// Joint node IDs, indexed by the geometry's joint attribute.
    #[inline]
    pub fn joints(&self) -> &[Option<Id>] {
        &self.joints
    }

    /// Inverse bind matrices, one per joint.
    #[inline]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// Per-joint skinning matrices in the mesh node's space:
    /// `inverse(mesh_world) × world(joint) × inverse_bind`.
    ///
    /// Missing joints, and joints without a world matrix (hidden or
    /// detached), fall back to the bind pose.
    pub fn joint_matrices(&self, worlds: &HashMap<Id, Mat4>, mesh_world: &Mat4) -> Vec<Mat4> {
        let to_mesh = mesh_world.inverse();
        self.joints
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(joint, ibm)| match joint.and_then(|id| worlds.get(&id)) {
                Some(world) => to_mesh * *world * *ibm,
                None => Mat4::IDENTITY,
            })
            .collect()
    }
}

/// Skin positions and normals on the CPU.
///
/// Vertices with no usable weights keep their bind pose.
pub fn skin_vertices(geometry: &BufferGeometry, joint_matrices: &[Mat4]) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let positions = geometry.positions();
    let normals = geometry.normals();
    let joints = geometry.joints();
    let weights = geometry.weights();

    let mut out_positions = Vec::with_capacity(positions.len());
    let mut out_normals = Vec::with_capacity(positions.len());

    for (i, position) in positions.iter().enumerate() {
        let mut matrix = Mat4::ZERO;
        let mut total = 0.0;
        if let (Some(j), Some(w)) = (joints.get(i), weights.get(i)) {
            for k in 0..4 {
                if w[k] <= 0.0 {
                    continue;
                }
                if let Some(m) = joint_matrices.get(j[k] as usize) {
                    matrix += *m * w[k];
                    total += w[k];
                }
            }
        }
        let matrix = if total > 0.0 { matrix * (1.0 / total) } else { Mat4::IDENTITY };

        out_positions.push(matrix.transform_point3((*position).into()).to_array());
        let normal = normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
        out_normals.push(
            matrix
                .transform_vector3(normal.into())
                .normalize_or_zero()
                .to_array(),
        );
    }

    (out_positions, out_normals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_bind_pose_is_identity() {
        let joint = Id::new();
        let bind = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let skin = Skin::new(vec![Some(joint)], vec![bind.inverse()]);
        let worlds = HashMap::from([(joint, bind)]);
        let m = skin.joint_matrices(&worlds, &Mat4::IDENTITY);
        assert!(m[0].abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_missing_ibm_padded() {
        let skin = Skin::new(vec![Some(Id::new()), Some(Id::new())], vec![]);
        assert_eq!(skin.inverse_bind_matrices().len(), 2);
    }

    #[test]
    fn test_missing_joint_keeps_slot() {
        let joint = Id::new();
        let skin = Skin::new(
            vec![None, Some(joint)],
            vec![Mat4::from_translation(Vec3::X), Mat4::IDENTITY],
        );
        let worlds = HashMap::from([(joint, Mat4::from_translation(Vec3::Y))]);
        let m = skin.joint_matrices(&worlds, &Mat4::IDENTITY);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0], Mat4::IDENTITY);
        assert!(m[1].abs_diff_eq(Mat4::from_translation(Vec3::Y), 1e-6));
    }

    #[test]
    fn test_skin_vertices_blends_joints() {
        let geo = BufferGeometry::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]])
            .with_normals(vec![[0.0, 1.0, 0.0]; 2])
            .with_skin_attributes(
                vec![[0, 1, 0, 0], [0, 0, 0, 0]],
                vec![[0.5, 0.5, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]],
            );
        let joints = [
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0)),
        ];
        let (positions, normals) = skin_vertices(&geo, &joints);
        assert_eq!(positions[0], [0.0, 3.0, 0.0]);
        assert_eq!(positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(normals[0], [0.0, 1.0, 0.0]);
    }
}
