//! Base loader trait and common types.

use super::GltfLoader;
use crate::animation::AnimationClip;
use crate::scene::Node;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Loading state for async operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Not started.
    #[default]
    Idle,
    /// Currently loading.
    Loading,
    /// Successfully loaded.
    Loaded,
    /// Failed to load.
    Failed,
}

/// Errors that can occur while loading a model.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading the file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid glTF.
    #[error("Failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    /// A primitive has no POSITION attribute.
    #[error("Mesh {mesh} primitive {primitive} is missing positions")]
    MissingPositions {
        /// glTF mesh index.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },

    /// The document has no scene to instantiate.
    #[error("glTF document has no scene")]
    NoScene,

    /// Fetching over the network failed.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Error reported by the browser.
        message: String,
    },
}

/// A model ready to be moved into a scene.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Root of the model hierarchy.
    pub root: Node,
    /// Animation clips, in document order.
    pub animations: Vec<Arc<AnimationClip>>,
}

impl LoadedModel {
    /// Number of mesh nodes in the hierarchy.
    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.root.traverse(|node| {
            if node.is_mesh() {
                count += 1;
            }
        });
        count
    }

    /// Set shadow flags on every mesh node.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        self.root.traverse_mut(|node| {
            if node.is_mesh() {
                node.cast_shadow = cast;
                node.receive_shadow = receive;
            }
        });
    }
}

/// Something that turns a model URI into a [`LoadedModel`].
pub trait ModelLoader {
    /// Load and parse the model.
    fn load(&self, uri: &str) -> Result<LoadedModel, LoadError>;
}

/// Loads glTF models from the filesystem, relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base: PathBuf,
    gltf: GltfLoader,
}

impl FileLoader {
    /// Create a loader resolving URIs against `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            gltf: GltfLoader::new(),
        }
    }
}

impl ModelLoader for FileLoader {
    fn load(&self, uri: &str) -> Result<LoadedModel, LoadError> {
        let path = self.base.join(uri);
        log::debug!("Loading model from {}", path.display());
        let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.gltf.load_from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BufferGeometry;
    use crate::material::PhongMaterial;
    use crate::objects::Mesh;

    #[test]
    fn test_set_shadows_marks_meshes_only() {
        let mut root = Node::group("model");
        let geometry = BufferGeometry::new(vec![[0.0; 3]; 3]);
        root.add(Node::mesh("body", Mesh::new(geometry, PhongMaterial::default())));
        let mut model = LoadedModel {
            root,
            animations: Vec::new(),
        };
        model.set_shadows(true, true);

        assert_eq!(model.mesh_count(), 1);
        assert!(!model.root.cast_shadow);
        let body = model.root.find_by_name("body").unwrap();
        assert!(body.cast_shadow && body.receive_shadow);
    }

    #[test]
    fn test_file_loader_missing_file() {
        let loader = FileLoader::new("/nonexistent");
        let err = loader.load("models/none.glb").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("none.glb"));
    }
}
