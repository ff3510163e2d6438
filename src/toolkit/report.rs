use serde_json::{json, Value};

use crate::core::shared::SceneNodeIdx;
use crate::features;

/// Why a node carrying feature metadata was left as loaded.
#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("Feature ID accessor {0} could not be loaded")]
    AccessorLoadFailed(usize),
    #[error("Feature ID accessor is empty")]
    EmptyAccessor,
    #[error("Feature extension has no feature ID sets")]
    EmptyFeatureIds,
    #[error("Feature ID set has no vertex attribute (texture feature IDs are not supported)")]
    FeatureIdSetWithoutAttribute,
    #[error("Feature ID accessor has {feature_ids} entries but the mesh has {instances} instances")]
    InstanceCountMismatch { feature_ids: usize, instances: usize },
    #[error("The batched mesh is instanced, which is not supported")]
    InstancedBatchedMesh,
    #[error("The instanced node contains a batched mesh, which is not supported")]
    InstancedNodeHasMeshFeatures,
    #[error("Feature ID accessor holds an invalid value: {0}")]
    InvalidFeatureIds(String),
    #[error("Malformed extension object: {0}")]
    MalformedExtension(String),
    #[error("Instancing extension has no attribute named {0}")]
    MissingFeatureIdAccessor(String),
    #[error("Feature ID set {index} is not defined")]
    MissingFeatureIdSet { index: usize },
    #[error("Instance features used without EXT_mesh_gpu_instancing")]
    MissingGpuInstancing,
    #[error("Node subtree holds no instanced mesh")]
    NoInstancedMesh,
    #[error("Object is a {0}, not a mesh")]
    NotAMesh(&'static str),
    #[error("glTF node could not be resolved to a scene node")]
    UnresolvedNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    MeshFeatures,
    InstanceFeatures,
}

impl Pipeline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeshFeatures => "mesh features",
            Self::InstanceFeatures => "instance features",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Distinct feature IDs in the result.
    pub feature_count: usize,
    /// Sub-geometry instances for a batched mesh, instance slots for an instanced one.
    pub instance_count: usize,
    /// Triangles whose vertices disagree on the feature ID. `None` when not checked.
    pub mixed_triangles: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Batched(BatchSummary),
    Skipped(SkipReason),
    Failed(features::Err),
}

impl Outcome {
    pub fn is_batched(&self) -> bool {
        matches!(self, Self::Batched(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    /// Scene node the outcome applies to, if one was identified.
    pub node: Option<SceneNodeIdx>,
    pub gltf_node: Option<usize>,
    pub pipeline: Pipeline,
    pub outcome: Outcome,
}

/// Per-node results of one `parse_mesh_features` run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureReport {
    outcomes: Vec<NodeOutcome>,
}

impl FeatureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, outcome: NodeOutcome) {
        match &outcome.outcome {
            Outcome::Batched(summary) => log::debug!(
                "{} node {:?}: batched {} features",
                outcome.pipeline.as_str(), outcome.node, summary.feature_count
            ),
            Outcome::Skipped(reason) => log::warn!(
                "{} node {:?} (glTF node {:?}) skipped: {}",
                outcome.pipeline.as_str(), outcome.node, outcome.gltf_node, reason
            ),
            Outcome::Failed(err) => log::warn!(
                "{} node {:?} (glTF node {:?}) left unbatched: {}",
                outcome.pipeline.as_str(), outcome.node, outcome.gltf_node, err
            ),
        }
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[NodeOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn for_node(&self, node: SceneNodeIdx) -> impl Iterator<Item = &NodeOutcome> {
        self.outcomes.iter().filter(move |o| o.node == Some(node))
    }

    pub fn num_batched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_batched()).count()
    }

    pub fn num_skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.outcome, Outcome::Skipped(_))).count()
    }

    pub fn num_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.outcome, Outcome::Failed(_))).count()
    }

    pub fn to_json(&self) -> Value {
        let outcomes = self.outcomes.iter()
            .map(|o| {
                let (status, detail) = match &o.outcome {
                    Outcome::Batched(s) => ("batched", json!({
                        "featureCount": s.feature_count,
                        "instanceCount": s.instance_count,
                        "mixedTriangles": s.mixed_triangles,
                    })),
                    Outcome::Skipped(reason) => ("skipped", json!(reason.to_string())),
                    Outcome::Failed(err) => ("failed", json!(err.to_string())),
                };
                json!({
                    "node": o.node,
                    "gltfNode": o.gltf_node,
                    "pipeline": o.pipeline.as_str(),
                    "status": status,
                    "detail": detail,
                })
            })
            .collect::<Vec<_>>();
        json!({
            "batched": self.num_batched(),
            "skipped": self.num_skipped(),
            "failed": self.num_failed(),
            "outcomes": outcomes,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_json() {
        let mut report = FeatureReport::new();
        report.push(NodeOutcome {
            node: Some(1),
            gltf_node: Some(0),
            pipeline: Pipeline::MeshFeatures,
            outcome: Outcome::Batched(BatchSummary { feature_count: 2, instance_count: 2, mixed_triangles: Some(0) }),
        });
        report.push(NodeOutcome {
            node: Some(2),
            gltf_node: Some(1),
            pipeline: Pipeline::MeshFeatures,
            outcome: Outcome::Failed(features::Err::FeatureCountMismatch { expected: 3, found: 2 }),
        });
        report.push(NodeOutcome {
            node: None,
            gltf_node: Some(4),
            pipeline: Pipeline::InstanceFeatures,
            outcome: Outcome::Skipped(SkipReason::MissingFeatureIdSet { index: 1 }),
        });

        assert_eq!((report.num_batched(), report.num_skipped(), report.num_failed()), (1, 1, 1));
        assert_eq!(report.for_node(2).count(), 1);

        let json = report.to_json();
        assert_eq!(json["outcomes"][0]["detail"]["featureCount"], 2);
        assert_eq!(json["outcomes"][1]["status"], "failed");
        assert_eq!(json["outcomes"][2]["detail"], "Feature ID set 1 is not defined");
        assert!(json["outcomes"][2]["node"].is_null());
    }
}
