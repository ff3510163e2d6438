use std::collections::HashMap;

use crate::core::extension::FeatureIdSet;
use crate::core::scene::instanced::{InstancedFeatureMesh, InstancedMesh};
use crate::core::shared::FeatureId;
use super::Err;

/// Wraps `instanced` with the slot -> feature ID array and the feature ID -> slot map.
///
/// Geometry, material, instance matrices, instance colors, the morph texture and
/// the bounding volumes are shared with the source, not copied. When several slots
/// carry the same feature ID the reverse map keeps the last of them.
pub fn generate_instanced_feature_mesh(
    instanced: &InstancedMesh,
    feature_ids: &[FeatureId],
    feature_id_set: &FeatureIdSet,
) -> Result<InstancedFeatureMesh, Err> {
    if feature_ids.is_empty() {
        return Err(Err::EmptyFeatureIds);
    }
    if feature_ids.len() != instanced.count() {
        return Err(Err::InstanceCountMismatch {
            feature_ids: feature_ids.len(),
            instances: instanced.count(),
        });
    }

    let index_feature_id_map = feature_ids.to_vec();
    let mut feature_id_index_map = HashMap::with_capacity(feature_ids.len());
    for (slot, &feature_id) in feature_ids.iter().enumerate() {
        feature_id_index_map.insert(feature_id, slot);
    }

    Ok(InstancedFeatureMesh::new(
        instanced.clone(),
        index_feature_id_map,
        feature_id_index_map,
        feature_id_set.clone(),
    ))
}
