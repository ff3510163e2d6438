//! Feature segmentation and geometry rebatching.
//!
//! A mesh annotated with a per-vertex feature ID array goes through three stages:
//! [`segment::count_vertices`] splits the vertex array into runs,
//! [`attribution::count_indices`] assigns triangles to features, and
//! [`batch::create_batched_mesh`] repacks every feature into its own sub-geometry.
//! Instanced meshes take the separate [`instance`] path.

pub mod segment;
pub mod attribution;
pub mod batch;
pub mod instance;

use indexmap::IndexMap;

use crate::core::extension::{feature_id_attribute_name, FeatureIdSet};
use crate::core::scene::batched::BatchedMesh;
use crate::core::scene::mesh::Mesh;
use crate::core::shared::{FeatureId, Section};

pub use self::attribution::MixedTriangle;

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Err {
    #[error("Batched mesh error: {0}")]
    BatchedMesh(#[from] crate::core::scene::batched::Err),
    #[error("Feature ID array is empty")]
    EmptyFeatureIds,
    #[error("No feature was found in the feature ID array")]
    EmptyFeatureInfos,
    #[error("Index array is empty")]
    EmptyIndices,
    #[error("Feature count mismatch: the feature ID set declares {expected} features but {found} were found")]
    FeatureCountMismatch { expected: u32, found: usize },
    #[error("Feature ID array has {feature_ids} entries but the geometry has {vertices} vertices")]
    FeatureIdLengthMismatch { feature_ids: usize, vertices: usize },
    #[error("Feature ID set has no vertex attribute (texture feature IDs are not supported)")]
    FeatureIdSetWithoutAttribute,
    #[error("Index array length {0} is not a multiple of 3")]
    IndexCountNotTriangles(usize),
    #[error("Index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Feature ID array has {feature_ids} entries but the mesh has {instances} instances")]
    InstanceCountMismatch { feature_ids: usize, instances: usize },
    #[error("{0}")]
    InvalidFeatureId(#[from] crate::core::accessor::Err),
    #[error("Geometry has no feature ID attribute named {0}")]
    MissingFeatureIdAttribute(String),
    #[error("Geometry is not indexed")]
    MissingIndices,
    #[error("Geometry has {normals} normals but {vertices} vertices")]
    NormalCountMismatch { normals: usize, vertices: usize },
    #[error("Section {start}..{end} is out of range for an array of length {len}")]
    SectionOutOfRange { start: usize, end: usize, len: usize },
    #[error("Feature ID {0} has no vertex section")]
    UnknownFeatureId(FeatureId),
}

/// Where one feature lives in the source vertex and index arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    pub feature_id: FeatureId,
    /// End-exclusive ranges over the vertex array, in scan order.
    pub vertex_sections: Vec<Section>,
    /// End-exclusive ranges over the index array, in scan order.
    pub index_sections: Vec<Section>,
}

impl FeatureInfo {
    pub fn new(feature_id: FeatureId) -> Self {
        Self {
            feature_id,
            vertex_sections: Vec::new(),
            index_sections: Vec::new(),
        }
    }
}

/// Feature infos keyed by feature ID, in the order the IDs were first seen.
pub type FeatureInfos = IndexMap<FeatureId, FeatureInfo>;

/// Batches `mesh` into one sub-geometry per feature of `feature_id_set`.
///
/// Name, transform, user data and morph target data are carried over from the
/// source mesh, and the material is shared with it.
pub fn generate_batched_feature_mesh(mesh: &Mesh, feature_id_set: &FeatureIdSet) -> Result<BatchedMesh, Err> {
    let geometry = &mesh.geometry;
    let feature_ids = read_feature_ids(mesh, feature_id_set)?;
    let indices = geometry.indices().ok_or(Err::MissingIndices)?;

    let mut feature_infos = segment::count_vertices(&feature_ids)?;
    if feature_ids.len() != geometry.vertex_count() {
        return Err(Err::FeatureIdLengthMismatch {
            feature_ids: feature_ids.len(),
            vertices: geometry.vertex_count(),
        });
    }
    attribution::count_indices(indices, &feature_ids, &mut feature_infos)?;

    let mut batched = batch::create_batched_mesh(
        &feature_infos,
        feature_id_set,
        geometry,
        mesh.material.clone(),
    )?;

    batched.object = mesh.object.clone();
    batched.morph_target_influences = mesh.morph_target_influences.clone();
    batched.morph_target_dictionary = mesh.morph_target_dictionary.clone();
    Ok(batched)
}

/// Lists the triangles of `mesh` whose vertices do not share one feature ID.
/// Such triangles are attributed to the feature of their first vertex when batching.
pub fn find_mixed_triangles_in_mesh(mesh: &Mesh, feature_id_set: &FeatureIdSet) -> Result<Vec<MixedTriangle>, Err> {
    let feature_ids = read_feature_ids(mesh, feature_id_set)?;
    let indices = mesh.geometry.indices().ok_or(Err::MissingIndices)?;
    attribution::find_mixed_triangles(indices, &feature_ids)
}

fn read_feature_ids(mesh: &Mesh, feature_id_set: &FeatureIdSet) -> Result<Vec<FeatureId>, Err> {
    let attribute = feature_id_set.attribute.ok_or(Err::FeatureIdSetWithoutAttribute)?;
    let array = mesh.geometry
        .feature_id_array(attribute)
        .ok_or_else(|| Err::MissingFeatureIdAttribute(feature_id_attribute_name(attribute)))?;
    Ok(array.to_feature_ids()?)
}
