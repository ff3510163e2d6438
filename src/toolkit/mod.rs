pub mod reader;
pub mod report;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::accessor::AccessorArray;
use crate::core::extension::FeatureIdSet;
use crate::core::scene::batched::BatchedMesh;
use crate::core::scene::mesh::Mesh;
use crate::core::scene::{Scene, SceneObject};
use crate::core::shared::{ConfigType, SceneNodeIdx};
use crate::features;
use self::reader::InstanceFeatureRequest;
use self::report::{BatchSummary, FeatureReport, NodeOutcome, Outcome, Pipeline, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Index of the feature ID set read from `EXT_mesh_features`.
    pub mesh_feature_id_set: usize,
    /// Index of the feature ID set read from `EXT_instance_features`.
    pub instance_feature_id_set: usize,
    /// Looks for triangles whose vertices disagree on the feature ID before batching.
    pub validate_triangles: bool,
}

impl ConfigType for Config {
    fn default() -> Self {
        Self {
            mesh_feature_id_set: 0,
            instance_feature_id_set: 0,
            validate_triangles: cfg!(debug_assertions),
        }
    }
}

/// Resolves a glTF accessor into a typed array. Resolves to `None` when the accessor
/// does not exist or cannot be read.
pub trait AccessorLoader {
    fn load_accessor(&self, index: usize) -> impl Future<Output = Option<AccessorArray>>;
}

/// Resolves a glTF node index into the scene node created for it.
pub trait DependencyResolver {
    fn get_dependency(&self, node_index: usize) -> impl Future<Output = Option<SceneNodeIdx>>;
}

/// A loaded asset: the scene, the raw glTF JSON, and the parser that produced them.
#[derive(Debug, Clone)]
pub struct Gltf<P> {
    pub scene: Scene,
    pub json: Value,
    pub parser: P,
}

/// Output of `parse_mesh_features`.
#[derive(Debug, Clone)]
pub struct ParsedScene {
    pub scene: Scene,
    pub report: FeatureReport,
}

/// Whether the asset uses either feature extension.
pub fn has_features<P>(gltf: &Gltf<P>) -> bool {
    reader::has_ext_mesh_features(&gltf.json) || reader::has_ext_instance_features(&gltf.json)
}

/// Returns a copy of the scene in which every mesh carrying `EXT_mesh_features` is
/// replaced by a batched mesh and every instanced mesh under a node carrying
/// `EXT_instance_features` by an instanced feature mesh. Nodes that cannot be batched
/// are left as loaded and reported.
pub async fn parse_mesh_features<P>(gltf: &Gltf<P>, config: &Config) -> ParsedScene
    where P: AccessorLoader + DependencyResolver
{
    let mut scene = gltf.scene.clone();
    let mut report = FeatureReport::new();

    if reader::has_ext_mesh_features(&gltf.json) {
        parse_ext_mesh_features(&mut scene, config, &mut report);
    }
    if reader::has_ext_instance_features(&gltf.json) {
        parse_ext_instance_features(gltf, &mut scene, config, &mut report).await;
    }

    log::info!(
        "feature parsing done: {} batched, {} skipped, {} failed",
        report.num_batched(), report.num_skipped(), report.num_failed()
    );
    ParsedScene { scene, report }
}

fn parse_ext_mesh_features(scene: &mut Scene, config: &Config, report: &mut FeatureReport) {
    // collect first; batching swaps objects but never changes the hierarchy
    let mut queued = Vec::new();
    for idx in scene.traverse() {
        let node = &scene.nodes()[idx];
        let outcome = |outcome| NodeOutcome {
            node: Some(idx),
            gltf_node: node.gltf_node_index,
            pipeline: Pipeline::MeshFeatures,
            outcome,
        };
        match reader::classify_mesh_node(node, config.mesh_feature_id_set) {
            Ok(None) => {},
            Ok(Some(set)) => queued.push((idx, set)),
            Err(reason) => report.push(outcome(Outcome::Skipped(reason))),
        }
    }

    for (idx, set) in queued {
        let node = &scene.nodes()[idx];
        let gltf_node = node.gltf_node_index;
        let SceneObject::Mesh(mesh) = &node.object else {
            continue;
        };
        let outcome = match batch_mesh(idx, mesh, &set, config) {
            Ok((batched, summary)) => {
                if let Some(node) = scene.get_node_mut(idx) {
                    node.object = SceneObject::BatchedMesh(batched);
                }
                Outcome::Batched(summary)
            },
            Err(err) => Outcome::Failed(err),
        };
        report.push(NodeOutcome { node: Some(idx), gltf_node, pipeline: Pipeline::MeshFeatures, outcome });
    }
}

fn batch_mesh(idx: SceneNodeIdx, mesh: &Mesh, set: &FeatureIdSet, config: &Config) -> Result<(BatchedMesh, BatchSummary), features::Err> {
    let mixed_triangles = if config.validate_triangles {
        let mixed = features::find_mixed_triangles_in_mesh(mesh, set)?;
        if let Some(first) = mixed.first() {
            log::warn!(
                "node {}: {} triangles span several features (first: triangle {} with {:?}); \
                 each is attributed to its first vertex",
                idx, mixed.len(), first.triangle, first.feature_ids
            );
        }
        Some(mixed.len())
    } else {
        None
    };

    let batched = features::generate_batched_feature_mesh(mesh, set)?;
    let summary = BatchSummary {
        feature_count: batched.num_geometries(),
        instance_count: batched.num_instances(),
        mixed_triangles,
    };
    Ok((batched, summary))
}

async fn parse_ext_instance_features<P>(gltf: &Gltf<P>, scene: &mut Scene, config: &Config, report: &mut FeatureReport)
    where P: AccessorLoader + DependencyResolver
{
    let num_gltf_nodes = gltf.json.get("nodes").and_then(Value::as_array).map_or(0, Vec::len);
    for gltf_node in 0..num_gltf_nodes {
        let skipped = |reason| NodeOutcome {
            node: None,
            gltf_node: Some(gltf_node),
            pipeline: Pipeline::InstanceFeatures,
            outcome: Outcome::Skipped(reason),
        };
        let request = match reader::classify_instance_node(&gltf.json, gltf_node, config.instance_feature_id_set) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(reason) => {
                report.push(skipped(reason));
                continue;
            }
        };
        if let Err(reason) = batch_instance_node(gltf, scene, gltf_node, request, report).await {
            report.push(skipped(reason));
        }
    }
}

/// Replaces every instanced mesh under the scene node of `gltf_node`. Errors that
/// concern the glTF node as a whole are returned; per-mesh outcomes go to `report`.
async fn batch_instance_node<P>(
    gltf: &Gltf<P>,
    scene: &mut Scene,
    gltf_node: usize,
    request: InstanceFeatureRequest,
    report: &mut FeatureReport,
) -> Result<(), SkipReason>
    where P: AccessorLoader + DependencyResolver
{
    let InstanceFeatureRequest { feature_id_set, accessor } = request;
    let feature_ids = gltf.parser.load_accessor(accessor).await
        .ok_or(SkipReason::AccessorLoadFailed(accessor))?;
    if feature_ids.is_empty() {
        return Err(SkipReason::EmptyAccessor);
    }
    let feature_ids = feature_ids.to_feature_ids()
        .map_err(|e| SkipReason::InvalidFeatureIds(e.to_string()))?;

    let root = gltf.parser.get_dependency(gltf_node).await
        .ok_or(SkipReason::UnresolvedNode)?;
    let instanced_nodes = scene.traverse_from(root)
        .into_iter()
        .filter(|&idx| matches!(scene.nodes()[idx].object, SceneObject::InstancedMesh(_)))
        .collect::<Vec<_>>();
    if instanced_nodes.is_empty() {
        return Err(SkipReason::NoInstancedMesh);
    }

    for idx in instanced_nodes {
        let SceneObject::InstancedMesh(instanced) = &scene.nodes()[idx].object else {
            continue;
        };
        let outcome = match features::instance::generate_instanced_feature_mesh(instanced, &feature_ids, &feature_id_set) {
            Ok(mesh) => {
                let summary = BatchSummary {
                    feature_count: mesh.feature_id_index_map().len(),
                    instance_count: mesh.count(),
                    mixed_triangles: None,
                };
                if let Some(node) = scene.get_node_mut(idx) {
                    node.object = SceneObject::InstancedFeatureMesh(mesh);
                }
                Outcome::Batched(summary)
            },
            Err(features::Err::InstanceCountMismatch { feature_ids, instances }) => {
                Outcome::Skipped(SkipReason::InstanceCountMismatch { feature_ids, instances })
            },
            Err(err) => Outcome::Failed(err),
        };
        report.push(NodeOutcome { node: Some(idx), gltf_node: Some(gltf_node), pipeline: Pipeline::InstanceFeatures, outcome });
    }
    Ok(())
}
