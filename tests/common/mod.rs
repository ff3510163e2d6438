#![allow(dead_code)]

use serde_json::{json, Value};

const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

/// Assembles a GLB asset in memory. Every accessor gets its own buffer view in the
/// single binary chunk.
pub struct GlbBuilder {
    json: Value,
    bin: Vec<u8>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self {
            json: json!({
                "asset": { "version": "2.0" },
                "scene": 0,
                "scenes": [{ "nodes": [] }],
                "nodes": [],
                "meshes": [],
                "materials": [],
                "accessors": [],
                "bufferViews": [],
                "buffers": [],
            }),
            bin: Vec::new(),
        }
    }

    pub fn extensions_used(&mut self, names: &[&str]) -> &mut Self {
        self.json["extensionsUsed"] = json!(names);
        self
    }

    pub fn positions(&mut self, data: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in data {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        let bytes = data.iter().flatten().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        self.accessor(&bytes, COMPONENT_F32, "VEC3", data.len(), json!({ "min": min, "max": max }))
    }

    pub fn vec3(&mut self, data: &[[f32; 3]]) -> usize {
        let bytes = data.iter().flatten().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        self.accessor(&bytes, COMPONENT_F32, "VEC3", data.len(), json!({}))
    }

    pub fn indices(&mut self, data: &[u32]) -> usize {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        self.accessor(&bytes, COMPONENT_U32, "SCALAR", data.len(), json!({}))
    }

    pub fn scalars_u16(&mut self, data: &[u16]) -> usize {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        self.accessor(&bytes, COMPONENT_U16, "SCALAR", data.len(), json!({}))
    }

    pub fn scalars_f32(&mut self, data: &[f32]) -> usize {
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        self.accessor(&bytes, COMPONENT_F32, "SCALAR", data.len(), json!({}))
    }

    pub fn add_material(&mut self, material: Value) -> usize {
        push(&mut self.json["materials"], material)
    }

    pub fn add_mesh(&mut self, mesh: Value) -> usize {
        push(&mut self.json["meshes"], mesh)
    }

    pub fn add_node(&mut self, node: Value) -> usize {
        push(&mut self.json["nodes"], node)
    }

    pub fn add_root(&mut self, node: usize) -> &mut Self {
        push(&mut self.json["scenes"][0]["nodes"], json!(node));
        self
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn json_mut(&mut self) -> &mut Value {
        &mut self.json
    }

    pub fn build(&self) -> Vec<u8> {
        let mut json = self.json.clone();
        json["buffers"] = json!([{ "byteLength": self.bin.len() }]);
        let mut json_chunk = serde_json::to_vec(&json).unwrap();
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }

        let total = 12 + 8 + json_chunk.len() + 8 + self.bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
        out.extend_from_slice(&json_chunk);
        out.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        out.extend_from_slice(&self.bin);
        out
    }

    fn accessor(&mut self, bytes: &[u8], component_type: u32, ty: &str, count: usize, extra: Value) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let view = push(&mut self.json["bufferViews"], json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        let mut accessor = json!({
            "bufferView": view,
            "componentType": component_type,
            "type": ty,
            "count": count,
        });
        if let Value::Object(extra) = extra {
            for (k, v) in extra {
                accessor[k.as_str()] = v;
            }
        }
        push(&mut self.json["accessors"], accessor)
    }
}

fn push(array: &mut Value, value: Value) -> usize {
    let array = array.as_array_mut().unwrap();
    array.push(value);
    array.len() - 1
}

/// Two quads side by side: vertices 0..4 form the left quad, 4..8 the right one.
pub fn two_quads() -> (Vec<[f32; 3]>, Vec<u32>) {
    let positions = vec![
        [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
        [2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [3.0, 1.0, 0.0], [2.0, 1.0, 0.0],
    ];
    let indices = vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7];
    (positions, indices)
}

/// A mesh-features asset: one node holding the two quads, tagged 10 and 20.
pub fn featured_quads(feature_count: u32) -> GlbBuilder {
    let mut glb = GlbBuilder::new();
    glb.extensions_used(&["EXT_mesh_features"]);
    let (positions, indices) = two_quads();
    let position = glb.positions(&positions);
    let normal = glb.vec3(&[[0.0, 0.0, 1.0]; 8]);
    let index = glb.indices(&indices);
    let feature_ids = glb.scalars_u16(&[10, 10, 10, 10, 20, 20, 20, 20]);
    let mesh = glb.add_mesh(json!({
        "name": "quads",
        "primitives": [{
            "attributes": { "POSITION": position, "NORMAL": normal, "_FEATURE_ID_0": feature_ids },
            "indices": index,
            "extensions": {
                "EXT_mesh_features": { "featureIds": [{ "featureCount": feature_count, "attribute": 0 }] }
            }
        }]
    }));
    let node = glb.add_node(json!({ "name": "building", "mesh": mesh, "translation": [1.0, 2.0, 3.0] }));
    glb.add_root(node);
    glb
}

/// An instance-features asset: one node drawing a triangle at three translations.
pub fn instanced_triangles(instance_feature_ids: &[f32]) -> GlbBuilder {
    let mut glb = GlbBuilder::new();
    glb.extensions_used(&["EXT_instance_features", "EXT_mesh_gpu_instancing"]);
    let position = glb.positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let index = glb.indices(&[0, 1, 2]);
    let translation = glb.vec3(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [20.0, 0.0, 0.0]]);
    let feature_ids = glb.scalars_f32(instance_feature_ids);
    let mesh = glb.add_mesh(json!({
        "name": "tree",
        "primitives": [{ "attributes": { "POSITION": position }, "indices": index }]
    }));
    let node = glb.add_node(json!({
        "name": "forest",
        "mesh": mesh,
        "extensions": {
            "EXT_mesh_gpu_instancing": { "attributes": { "TRANSLATION": translation, "_FEATURE_ID_0": feature_ids } },
            "EXT_instance_features": { "featureIds": [{ "featureCount": 2, "attribute": 0 }] }
        }
    }));
    glb.add_root(node);
    glb
}
