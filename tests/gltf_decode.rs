mod common;

use std::sync::Arc;

use mesh_features::io::gltf::decode::{Err, GltfDecoder};
use mesh_features::prelude::*;
use serde_json::json;

use common::{featured_quads, instanced_triangles, GlbBuilder};

#[test]
fn single_primitive_node() {
    let gltf = GltfDecoder::new().decode_from_slice(&featured_quads(2).build()).unwrap();
    assert_eq!(gltf.scene.num_nodes(), 1);

    let node = &gltf.scene.nodes()[0];
    assert_eq!(node.gltf_node_index, Some(0));
    assert!(node.has_extension(mesh_features::core::extension::ExtensionName::MeshFeatures));
    let SceneObject::Mesh(mesh) = &node.object else {
        panic!("expected a mesh, got {}", node.object.kind_name());
    };
    assert_eq!(mesh.object.name, "building");
    assert_eq!(mesh.geometry.vertex_count(), 8);
    assert_eq!(mesh.geometry.index_count(), 12);
    assert!(mesh.geometry.normals().is_some());
    assert_eq!(
        mesh.geometry.get_attribute("_feature_id_0"),
        Some(&AccessorArray::U16(vec![10, 10, 10, 10, 20, 20, 20, 20]))
    );
    let feature_ids = mesh.geometry.feature_id_array(0).unwrap().to_feature_ids().unwrap();
    assert_eq!(feature_ids, vec![10, 10, 10, 10, 20, 20, 20, 20]);
}

#[test]
fn multi_primitive_mesh_becomes_a_group() {
    let mut glb = GlbBuilder::new();
    let (positions, indices) = common::two_quads();
    let position = glb.positions(&positions);
    let index = glb.indices(&indices);
    let material = glb.add_material(json!({
        "name": "brick",
        "doubleSided": true,
        "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.5, 0.25, 1.0], "metallicFactor": 0.0 }
    }));
    let mesh = glb.add_mesh(json!({
        "name": "walls",
        "weights": [0.25],
        "extras": { "targetNames": ["open"] },
        "primitives": [
            { "attributes": { "POSITION": position }, "indices": index, "material": material },
            { "attributes": { "POSITION": position }, "indices": index, "material": material },
            { "attributes": { "POSITION": position }, "mode": 0 },
        ]
    }));
    let child = glb.add_node(json!({ "name": "walls", "mesh": mesh, "extras": { "id": "w-1" } }));
    let root = glb.add_node(json!({
        "name": "root",
        "children": [child],
        "matrix": [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 6.0, 7.0, 1.0]
    }));
    glb.add_root(root);

    let gltf = GltfDecoder::new().decode_from_slice(&glb.build()).unwrap();
    let scene = &gltf.scene;

    let root_idx = scene.root_node_indices()[0];
    let root_node = &scene.nodes()[root_idx];
    assert_eq!(root_node.get_name(), "root");
    let matrix = root_node.object.object().trs.to_matrix();
    assert_eq!([matrix.data[0][3], matrix.data[1][3], matrix.data[2][3]], [5.0, 6.0, 7.0]);

    let walls_idx = root_node.children()[0];
    let walls = &scene.nodes()[walls_idx];
    assert!(matches!(walls.object, SceneObject::Group(_)));
    assert_eq!(walls.object.object().user_data, json!({ "id": "w-1" }));
    assert_eq!(walls.children().len(), 3);

    let primitives = walls.children().iter().map(|&i| &scene.nodes()[i].object).collect::<Vec<_>>();
    let (SceneObject::Mesh(a), SceneObject::Mesh(b)) = (primitives[0], primitives[1]) else {
        panic!("expected triangle primitives to load as meshes");
    };
    assert!(Arc::ptr_eq(&a.material, &b.material));
    assert_eq!(a.material.get_name(), "brick");
    assert!(a.material.is_double_sided());
    assert_eq!(a.material.get_color_factor(), [1.0, 0.5, 0.25, 1.0]);
    assert_eq!(a.material.get_metallic_factor(), 0.0);
    assert_eq!(a.material.get_roughness_factor(), 1.0);
    assert_eq!(a.morph_target_influences, vec![0.25]);
    assert_eq!(a.morph_target_dictionary.get("open"), Some(&0));
    assert!(matches!(primitives[2], SceneObject::Points(_)));

    assert_eq!(gltf.parser.scene_node_of(child), Some(walls_idx));
    assert_eq!(pollster::block_on(gltf.parser.get_dependency(root)), Some(root_idx));
    assert_eq!(pollster::block_on(gltf.parser.get_dependency(42)), None);
}

#[test]
fn instanced_node() {
    let gltf = GltfDecoder::new().decode_from_slice(&instanced_triangles(&[5.0, 5.0, 7.0]).build()).unwrap();
    let SceneObject::InstancedMesh(mesh) = &gltf.scene.nodes()[0].object else {
        panic!("expected an instanced mesh");
    };
    assert_eq!(mesh.count(), 3);
    assert_eq!(mesh.instance_matrix[1].data[0][3], 10.0);
    assert!(mesh.bounding_box.is_some());
    assert_eq!(mesh.object.name, "forest");
}

#[test]
fn accessors_load_through_the_parser() {
    let glb = instanced_triangles(&[5.0, 5.0, 7.0]);
    let feature_accessor = glb.json()["nodes"][0]["extensions"]["EXT_mesh_gpu_instancing"]["attributes"]["_FEATURE_ID_0"]
        .as_u64()
        .unwrap() as usize;
    let gltf = GltfDecoder::new().decode_from_slice(&glb.build()).unwrap();

    let loaded = pollster::block_on(gltf.parser.load_accessor(feature_accessor)).unwrap();
    assert_eq!(loaded.to_feature_ids(), Ok(vec![5, 5, 7]));
    assert_eq!(pollster::block_on(gltf.parser.load_accessor(99)), None);
}

#[test]
fn malformed_accessors_are_errors() {
    fn feature_accessor(glb: &mut GlbBuilder) -> &mut serde_json::Value {
        let index = glb.json()["meshes"][0]["primitives"][0]["attributes"]["_FEATURE_ID_0"].as_u64().unwrap() as usize;
        &mut glb.json_mut()["accessors"][index]
    }

    let mut glb = featured_quads(2);
    feature_accessor(&mut glb)["count"] = json!((1u64 << 63) + 5);
    assert!(matches!(
        GltfDecoder::new().decode_from_slice(&glb.build()),
        Err(Err::AccessorOutOfBounds { .. })
    ));

    let mut glb = featured_quads(2);
    let view = feature_accessor(&mut glb)["bufferView"].as_u64().unwrap() as usize;
    glb.json_mut()["bufferViews"][view]["byteStride"] = json!(1);
    assert!(matches!(
        GltfDecoder::new().decode_from_slice(&glb.build()),
        Err(Err::InvalidStride { stride: 1, .. })
    ));
}

#[test]
fn rejects_garbage() {
    assert!(GltfDecoder::new().decode_from_slice(b"not a gltf").is_err());
    assert!(GltfDecoder::new().decode_from_slice(b"glTF\x02\0\0\0").is_err());
}
