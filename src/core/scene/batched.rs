use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::extension::FeatureIdSet;
use crate::core::geometry::Geometry;
use crate::core::material::Material;
use crate::core::shared::FeatureId;
use super::Object3d;

/// Handle of a sub-geometry inside a `BatchedMesh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

/// Handle of a draw unit inside a `BatchedMesh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub usize);

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Err {
    #[error("Geometry count exceeded: the batched mesh holds at most {0} geometries")]
    GeometryCountExceeded(usize),
    #[error("Index count exceeded: {requested} indices requested but only {available} remain")]
    IndexCountExceeded { requested: usize, available: usize },
    #[error("Unknown geometry id {0}")]
    UnknownGeometry(usize),
    #[error("Unknown instance id {0}")]
    UnknownInstance(usize),
    #[error("Vertex count exceeded: {requested} vertices requested but only {available} remain")]
    VertexCountExceeded { requested: usize, available: usize },
}

/// One draw unit of a batched mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchedInstance {
    pub geometry: GeometryId,
    pub visible: bool,
}

/// A single drawable holding many independently addressable sub-geometries.
/// Capacities are fixed at construction so the whole batch can be uploaded as
/// one vertex and one index buffer.
#[derive(Debug, Clone)]
pub struct BatchedMesh {
    pub object: Object3d,
    pub material: Arc<Material>,
    pub morph_target_influences: Vec<f32>,
    pub morph_target_dictionary: IndexMap<String, usize>,

    max_geometry_count: usize,
    max_vertex_count: usize,
    max_index_count: usize,
    geometries: Vec<Geometry>,
    instances: Vec<BatchedInstance>,

    // Which sub-geometry holds which feature.
    feature_geometries: IndexMap<FeatureId, GeometryId>,
    feature_id_set: FeatureIdSet,
}

impl BatchedMesh {
    pub fn new(max_geometry_count: usize, max_vertex_count: usize, max_index_count: usize, material: Arc<Material>) -> Self {
        Self {
            object: Object3d::default(),
            material,
            morph_target_influences: Vec::new(),
            morph_target_dictionary: IndexMap::new(),
            max_geometry_count,
            max_vertex_count,
            max_index_count,
            geometries: Vec::with_capacity(max_geometry_count),
            instances: Vec::with_capacity(max_geometry_count),
            feature_geometries: IndexMap::with_capacity(max_geometry_count),
            feature_id_set: FeatureIdSet::default(),
        }
    }

    /// Adds a geometry to the batch and returns its handle.
    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<GeometryId, Err> {
        if self.geometries.len() >= self.max_geometry_count {
            return Err(Err::GeometryCountExceeded(self.max_geometry_count));
        }
        let available = self.max_vertex_count - self.vertex_count();
        if geometry.vertex_count() > available {
            return Err(Err::VertexCountExceeded { requested: geometry.vertex_count(), available });
        }
        let available = self.max_index_count - self.index_count();
        if geometry.index_count() > available {
            return Err(Err::IndexCountExceeded { requested: geometry.index_count(), available });
        }
        self.geometries.push(geometry);
        Ok(GeometryId(self.geometries.len() - 1))
    }

    /// Adds a visible draw unit for the given geometry.
    pub fn add_instance(&mut self, geometry: GeometryId) -> Result<InstanceId, Err> {
        if geometry.0 >= self.geometries.len() {
            return Err(Err::UnknownGeometry(geometry.0));
        }
        self.instances.push(BatchedInstance { geometry, visible: true });
        Ok(InstanceId(self.instances.len() - 1))
    }

    pub fn set_visible_at(&mut self, instance: InstanceId, visible: bool) -> Result<(), Err> {
        let inst = self.instances.get_mut(instance.0)
            .ok_or(Err::UnknownInstance(instance.0))?;
        inst.visible = visible;
        Ok(())
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn instances(&self) -> &[BatchedInstance] {
        &self.instances
    }

    pub fn num_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.geometries.iter().map(|g| g.vertex_count()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.geometries.iter().map(|g| g.index_count()).sum()
    }

    pub fn max_geometry_count(&self) -> usize {
        self.max_geometry_count
    }

    pub(crate) fn set_feature_geometry(&mut self, feature_id: FeatureId, geometry: GeometryId) {
        self.feature_geometries.insert(feature_id, geometry);
    }

    /// Returns the sub-geometry holding the given feature.
    pub fn geometry_for_feature(&self, feature_id: FeatureId) -> Option<GeometryId> {
        self.feature_geometries.get(&feature_id).copied()
    }

    /// Feature IDs in the order their sub-geometries were added.
    pub fn feature_ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.feature_geometries.keys().copied()
    }

    pub(crate) fn set_feature_id_set(&mut self, set: FeatureIdSet) {
        self.feature_id_set = set;
    }

    pub fn feature_id_set(&self) -> &FeatureIdSet {
        &self.feature_id_set
    }
}
