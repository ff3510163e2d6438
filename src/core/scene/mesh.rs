use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::geometry::Geometry;
use crate::core::material::Material;
use super::{Extensions, Object3d};

/// A triangle mesh as produced by the loader: one glTF primitive.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub object: Object3d,
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub morph_target_influences: Vec<f32>,
    pub morph_target_dictionary: IndexMap<String, usize>,
    /// Primitive-level extensions, e.g. `EXT_mesh_features`.
    pub extensions: Extensions,
}

impl Mesh {
    pub fn new(object: Object3d, geometry: Geometry, material: Arc<Material>) -> Self {
        Self {
            object,
            geometry: Arc::new(geometry),
            material,
            morph_target_influences: Vec::new(),
            morph_target_dictionary: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }
}

/// A point or line primitive. It carries geometry but no triangles, so it can never be batched.
#[derive(Debug, Clone)]
pub struct Points {
    pub object: Object3d,
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub extensions: Extensions,
}
