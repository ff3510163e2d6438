use clap::Parser;
use anyhow::Result;
use std::path::Path;
use mesh_features::io::gltf::decode::GltfDecoder;
use mesh_features::core::material::Material;
use mesh_features::prelude::*;

#[derive(Parser)]
#[command(name = "mesh-features")]
#[command(about = "Batch glTF meshes and instances by their EXT_mesh_features / EXT_instance_features IDs")]
struct Cli {
    /// Input file path (.gltf or .glb)
    #[arg(short, long)]
    input: String,

    /// Load the asset and list its nodes without batching
    #[arg(long)]
    no_batch: bool,

    /// Index of the EXT_mesh_features feature ID set to batch by
    #[arg(long, default_value_t = 0)]
    mesh_feature_id_set: usize,

    /// Index of the EXT_instance_features feature ID set to batch by
    #[arg(long, default_value_t = 0)]
    instance_feature_id_set: usize,

    /// Report triangles whose vertices carry different feature IDs
    #[arg(long)]
    validate: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input_ext = Path::new(&cli.input)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if !matches!(input_ext, "gltf" | "glb") {
        anyhow::bail!("Input file must be a .gltf or .glb file");
    }

    let gltf = GltfDecoder::new()
        .decode_from_file(&cli.input)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", cli.input, e))?;
    log::info!("loaded {} ({} scene nodes)", cli.input, gltf.scene.num_nodes());

    if cli.no_batch || !has_features(&gltf) {
        if !cli.no_batch {
            log::info!("{} uses neither EXT_mesh_features nor EXT_instance_features", cli.input);
        }
        print_scene(&gltf.scene, cli.json);
        return Ok(());
    }

    let mut config = Config::default();
    config.mesh_feature_id_set = cli.mesh_feature_id_set;
    config.instance_feature_id_set = cli.instance_feature_id_set;
    config.validate_triangles = cli.validate;

    let parsed = pollster::block_on(parse_mesh_features(&gltf, &config));
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&parsed.report.to_json())?);
    } else {
        print_scene(&parsed.scene, false);
        print_report(&parsed.report);
    }
    Ok(())
}

fn print_scene(scene: &Scene, json: bool) {
    if json {
        let nodes = scene.traverse()
            .into_iter()
            .map(|idx| {
                let node = &scene.nodes()[idx];
                serde_json::json!({
                    "node": idx,
                    "gltfNode": node.gltf_node_index,
                    "name": node.get_name(),
                    "kind": node.object.kind_name(),
                })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::Value::Array(nodes));
        return;
    }
    let mut visited = vec![false; scene.num_nodes()];
    for &root in scene.root_node_indices() {
        print_subtree(scene, root, 0, &mut visited);
    }
}

fn print_subtree(scene: &Scene, idx: usize, depth: usize, visited: &mut [bool]) {
    if std::mem::replace(&mut visited[idx], true) {
        return;
    }
    let node = &scene.nodes()[idx];
    let detail = match &node.object {
        SceneObject::BatchedMesh(m) => format!(" [{} features]", m.num_geometries()),
        SceneObject::InstancedFeatureMesh(m) => format!(" [{} instances, {} features]", m.count(), m.feature_id_index_map().len()),
        SceneObject::InstancedMesh(m) => format!(" [{} instances]", m.count()),
        SceneObject::Mesh(m) => format!(" [{} vertices]", m.geometry.vertex_count()),
        _ => String::new(),
    };
    let indent = "  ".repeat(depth);
    println!("{}#{} {} \"{}\"{}", indent, idx, node.object.kind_name(), node.get_name(), detail);
    let trs = &node.object.object().trs;
    if !trs.is_identity() {
        let t = trs.translation();
        println!("{}   at ({}, {}, {})", indent, t.x, t.y, t.z);
    }
    let material = match &node.object {
        SceneObject::Mesh(m) => Some(&m.material),
        SceneObject::Points(p) => Some(&p.material),
        SceneObject::InstancedMesh(m) => Some(&m.material),
        SceneObject::BatchedMesh(m) => Some(&m.material),
        SceneObject::InstancedFeatureMesh(m) => Some(&m.mesh().material),
        SceneObject::Group(_) => None,
    };
    if let Some(material) = material {
        println!("{}   material {}", indent, describe_material(material));
    }
    for &child in node.children() {
        print_subtree(scene, child, depth + 1, visited);
    }
}

fn describe_material(material: &Material) -> String {
    let [r, g, b, a] = material.get_color_factor();
    format!(
        "\"{}\" color ({}, {}, {}, {}) metallic {} roughness {}{}",
        material.get_name(), r, g, b, a,
        material.get_metallic_factor(), material.get_roughness_factor(),
        if material.is_double_sided() { " double-sided" } else { "" }
    )
}

fn print_report(report: &FeatureReport) {
    println!(
        "\n{} batched, {} skipped, {} failed",
        report.num_batched(), report.num_skipped(), report.num_failed()
    );
    for outcome in report.outcomes() {
        let status = match &outcome.outcome {
            Outcome::Batched(summary) => match summary.mixed_triangles {
                Some(mixed) if mixed > 0 => format!("batched ({} mixed triangles)", mixed),
                _ => "batched".to_owned(),
            },
            Outcome::Skipped(reason) => format!("skipped: {}", reason),
            Outcome::Failed(err) => format!("failed: {}", err),
        };
        println!(
            "  {} node {:?} (glTF {:?}): {}",
            outcome.pipeline.as_str(), outcome.node, outcome.gltf_node, status
        );
    }
}
