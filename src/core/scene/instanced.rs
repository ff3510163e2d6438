use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::extension::FeatureIdSet;
use crate::core::geometry::{BoundingBox, BoundingSphere, Geometry};
use crate::core::material::Material;
use crate::core::shared::FeatureId;
use super::{Extensions, Matrix4d, Object3d};

/// One geometry drawn once per instance slot, each slot with its own transform.
/// Buffers are reference counted so derived containers share them with the source.
#[derive(Debug, Clone)]
pub struct InstancedMesh {
    pub object: Object3d,
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub instance_matrix: Arc<[Matrix4d]>,
    pub instance_color: Option<Arc<[[f32; 3]]>>,
    /// Per-instance morph target influences, instance-major.
    pub morph_texture: Option<Arc<[f32]>>,
    pub bounding_box: Option<BoundingBox>,
    pub bounding_sphere: Option<BoundingSphere>,
    pub morph_target_influences: Vec<f32>,
    pub morph_target_dictionary: IndexMap<String, usize>,
    pub extensions: Extensions,
}

impl InstancedMesh {
    pub fn new(object: Object3d, geometry: Arc<Geometry>, material: Arc<Material>, instance_matrix: Vec<Matrix4d>) -> Self {
        Self {
            object,
            geometry,
            material,
            instance_matrix: instance_matrix.into(),
            instance_color: None,
            morph_texture: None,
            bounding_box: None,
            bounding_sphere: None,
            morph_target_influences: Vec::new(),
            morph_target_dictionary: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Number of instance slots.
    pub fn count(&self) -> usize {
        self.instance_matrix.len()
    }
}

/// An instanced mesh augmented with the slot <-> feature ID lookups.
#[derive(Debug, Clone)]
pub struct InstancedFeatureMesh {
    mesh: InstancedMesh,
    index_feature_id_map: Vec<FeatureId>,
    // Holds one slot per feature; when several slots share a feature ID the last one wins.
    feature_id_index_map: HashMap<FeatureId, usize>,
    feature_id_set: FeatureIdSet,
}

impl InstancedFeatureMesh {
    pub(crate) fn new(
        mesh: InstancedMesh,
        index_feature_id_map: Vec<FeatureId>,
        feature_id_index_map: HashMap<FeatureId, usize>,
        feature_id_set: FeatureIdSet,
    ) -> Self {
        Self { mesh, index_feature_id_map, feature_id_index_map, feature_id_set }
    }

    pub fn mesh(&self) -> &InstancedMesh {
        &self.mesh
    }

    pub(crate) fn object_mut(&mut self) -> &mut Object3d {
        &mut self.mesh.object
    }

    pub fn count(&self) -> usize {
        self.mesh.count()
    }

    /// Feature ID of the given instance slot.
    pub fn feature_id(&self, slot: usize) -> Option<FeatureId> {
        self.index_feature_id_map.get(slot).copied()
    }

    /// An instance slot carrying the given feature ID.
    pub fn slot(&self, feature_id: FeatureId) -> Option<usize> {
        self.feature_id_index_map.get(&feature_id).copied()
    }

    pub fn index_feature_id_map(&self) -> &[FeatureId] {
        &self.index_feature_id_map
    }

    pub fn feature_id_index_map(&self) -> &HashMap<FeatureId, usize> {
        &self.feature_id_index_map
    }

    pub fn feature_id_set(&self) -> &FeatureIdSet {
        &self.feature_id_set
    }
}
