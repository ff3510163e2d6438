use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Names of the glTF extensions this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionName {
    MeshFeatures,
    InstanceFeatures,
    MeshGpuInstancing,
}

impl ExtensionName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MeshFeatures => "EXT_mesh_features",
            Self::InstanceFeatures => "EXT_instance_features",
            Self::MeshGpuInstancing => "EXT_mesh_gpu_instancing",
        }
    }
}

impl std::fmt::Display for ExtensionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix of the vertex attribute holding feature IDs, as stored on a `Geometry`.
/// The glTF attribute `_FEATURE_ID_0` is therefore looked up as `_feature_id_0`.
pub const FEATURE_ID_ATTRIBUTE_NAME_PREFIX: &str = "_feature_id_";

/// Returns the geometry attribute name of the feature ID array with the given index.
pub fn feature_id_attribute_name(attribute: u32) -> String {
    format!("{}{}", FEATURE_ID_ATTRIBUTE_NAME_PREFIX, attribute)
}

/// Returns the `EXT_mesh_gpu_instancing` attribute name of the feature ID array with the
/// given index, e.g. `_FEATURE_ID_0`.
pub fn instancing_feature_id_attribute_name(attribute: u32) -> String {
    feature_id_attribute_name(attribute).to_uppercase()
}

/// Body of `EXT_mesh_features` and `EXT_instance_features`:
/// ```json
/// {
///   "featureIds": [
///     { "label": "rooms", "featureCount": 4, "attribute": 0, "propertyTable": 0 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtMeshFeatures {
    #[serde(default)]
    pub feature_ids: Vec<FeatureIdSet>,
}

impl ExtMeshFeatures {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureIdSet {
    /// Number of distinct feature IDs the set is expected to hold.
    pub feature_count: u32,
    /// Index `n` of the `_FEATURE_ID_n` attribute. `None` for texture-based feature IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_feature_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_table: Option<u32>,
}

impl FeatureIdSet {
    pub fn new(feature_count: u32, attribute: u32) -> Self {
        Self {
            feature_count,
            attribute: Some(attribute),
            ..Default::default()
        }
    }
}

/// Body of `EXT_mesh_gpu_instancing`. Maps attribute names (`TRANSLATION`, `ROTATION`,
/// `SCALE`, `_FEATURE_ID_0`, ...) to accessor indices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtMeshGpuInstancing {
    #[serde(default)]
    pub attributes: IndexMap<String, usize>,
}

impl ExtMeshGpuInstancing {
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn accessor(&self, name: &str) -> Option<usize> {
        self.attributes.get(name).copied()
    }
}
