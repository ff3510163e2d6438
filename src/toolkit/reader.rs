//! Detects feature extensions in an asset and decides, per node, whether and how it
//! is batched.

use serde_json::Value;

use crate::core::extension::{
    instancing_feature_id_attribute_name,
    ExtMeshFeatures,
    ExtMeshGpuInstancing,
    ExtensionName,
    FeatureIdSet,
};
use crate::core::scene::{SceneNode, SceneObject};
use super::report::SkipReason;

/// Whether the asset lists `extension` in its `extensionsUsed`.
pub fn uses_extension(json: &Value, extension: ExtensionName) -> bool {
    json.get("extensionsUsed")
        .and_then(Value::as_array)
        .is_some_and(|used| used.iter().any(|e| e.as_str() == Some(extension.as_str())))
}

pub fn has_ext_mesh_features(json: &Value) -> bool {
    uses_extension(json, ExtensionName::MeshFeatures)
}

pub fn has_ext_instance_features(json: &Value) -> bool {
    uses_extension(json, ExtensionName::InstanceFeatures)
}

/// Classifies a scene node for the mesh batching pipeline.
///
/// Returns `Ok(None)` for nodes without mesh feature metadata, and the selected
/// feature ID set for nodes to be batched.
pub fn classify_mesh_node(node: &SceneNode, feature_id_set_index: usize) -> Result<Option<FeatureIdSet>, SkipReason> {
    let Some(ext) = node.find_extension(ExtensionName::MeshFeatures) else {
        return Ok(None);
    };
    if matches!(node.object, SceneObject::InstancedMesh(_) | SceneObject::InstancedFeatureMesh(_))
        || node.has_extension(ExtensionName::MeshGpuInstancing)
    {
        return Err(SkipReason::InstancedBatchedMesh);
    }
    if !matches!(node.object, SceneObject::Mesh(_)) {
        return Err(SkipReason::NotAMesh(node.object.kind_name()));
    }
    if node.has_extension(ExtensionName::InstanceFeatures) {
        return Err(SkipReason::InstancedNodeHasMeshFeatures);
    }
    select_feature_id_set(ext, feature_id_set_index).map(Some)
}

/// What the instance pipeline needs to batch one glTF node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFeatureRequest {
    pub feature_id_set: FeatureIdSet,
    /// Accessor holding one feature ID per instance.
    pub accessor: usize,
}

/// Classifies the glTF node `node_index` of the raw asset JSON for the instance
/// batching pipeline. Returns `Ok(None)` for nodes without instance feature metadata.
pub fn classify_instance_node(
    json: &Value,
    node_index: usize,
    feature_id_set_index: usize,
) -> Result<Option<InstanceFeatureRequest>, SkipReason> {
    let Some(extensions) = json.get("nodes")
        .and_then(|nodes| nodes.get(node_index))
        .and_then(|node| node.get("extensions"))
    else {
        return Ok(None);
    };
    let Some(instance_features) = extensions.get(ExtensionName::InstanceFeatures.as_str()) else {
        return Ok(None);
    };
    let instancing = extensions.get(ExtensionName::MeshGpuInstancing.as_str())
        .ok_or(SkipReason::MissingGpuInstancing)?;
    if extensions.get(ExtensionName::MeshFeatures.as_str()).is_some() || node_mesh_has_features(json, node_index) {
        return Err(SkipReason::InstancedNodeHasMeshFeatures);
    }

    let feature_id_set = select_feature_id_set(instance_features, feature_id_set_index)?;
    let instancing = ExtMeshGpuInstancing::from_json(instancing)
        .map_err(|e| SkipReason::MalformedExtension(e.to_string()))?;
    // `select_feature_id_set` rejects sets without an attribute
    let attribute = feature_id_set.attribute.unwrap_or_default();
    let name = instancing_feature_id_attribute_name(attribute);
    let accessor = instancing.accessor(&name)
        .ok_or(SkipReason::MissingFeatureIdAccessor(name))?;
    Ok(Some(InstanceFeatureRequest { feature_id_set, accessor }))
}

/// Whether any primitive of the mesh referenced by the glTF node carries `EXT_mesh_features`.
fn node_mesh_has_features(json: &Value, node_index: usize) -> bool {
    let primitives = json["nodes"][node_index]["mesh"].as_u64()
        .and_then(|mesh| json["meshes"][mesh as usize]["primitives"].as_array());
    primitives.is_some_and(|primitives| {
        primitives.iter().any(|p| p["extensions"].get(ExtensionName::MeshFeatures.as_str()).is_some())
    })
}

fn select_feature_id_set(ext: &Value, index: usize) -> Result<FeatureIdSet, SkipReason> {
    let ext = ExtMeshFeatures::from_json(ext)
        .map_err(|e| SkipReason::MalformedExtension(e.to_string()))?;
    if ext.feature_ids.is_empty() {
        return Err(SkipReason::EmptyFeatureIds);
    }
    let set = ext.feature_ids.into_iter()
        .nth(index)
        .ok_or(SkipReason::MissingFeatureIdSet { index })?;
    if set.attribute.is_none() {
        return Err(SkipReason::FeatureIdSetWithoutAttribute);
    }
    Ok(set)
}
