use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gltf::mesh::Mode;
use indexmap::IndexMap;
use serde_json::Value;

use crate::core::accessor::AccessorArray;
use crate::core::extension::{ExtMeshGpuInstancing, ExtensionName};
use crate::core::geometry::Geometry;
use crate::core::material::Material;
use crate::core::scene::instanced::InstancedMesh;
use crate::core::scene::mesh::{Mesh, Points};
use crate::core::scene::{
    Extensions,
    Matrix4d,
    Object3d,
    Quaterniond,
    Scene,
    SceneNode,
    SceneObject,
    TrsMatrix,
    Vector3d,
};
use crate::core::shared::SceneNodeIdx;
use crate::toolkit::{AccessorLoader, DependencyResolver, Gltf};
use super::accessor::read_accessor;

#[remain::sorted]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Err {
    #[error("Accessor {index} reaches past the end of its buffer view")]
    AccessorOutOfBounds { index: usize },
    #[error("Buffer {0} is not loaded")]
    BufferNotLoaded(usize),
    #[error("Accessor {index} has a byte stride of {stride}, smaller than one element")]
    InvalidStride { index: usize, stride: usize },
    #[error("IO Error: {0}")]
    IoError(String),
    #[error("Failed to load glTF: {0}")]
    LoadError(String),
    #[error("Accessor {0} does not exist")]
    MissingAccessor(usize),
    #[error("Node {0} does not exist")]
    MissingNode(usize),
    #[error("Primitive {primitive} of mesh {mesh} has no POSITION attribute")]
    MissingPositions { mesh: usize, primitive: usize },
    #[error("Scene error: {0}")]
    SceneError(#[from] crate::core::scene::Err),
    #[error("Accessor {index} is sparse, which is not supported")]
    SparseAccessor { index: usize },
}

/// Decodes a glTF or GLB asset into a `Scene` plus the raw JSON and a parser that
/// answers accessor and node lookups afterwards.
///
/// Every glTF node becomes one scene node. A mesh with a single primitive is held by
/// the node itself; a mesh with several primitives becomes a group with one child per
/// primitive. Nodes carrying `EXT_mesh_gpu_instancing` hold instanced meshes.
#[derive(Debug, Default)]
pub struct GltfDecoder {}

impl GltfDecoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Loads a `.gltf` or `.glb` file. External buffers are resolved relative to the file.
    pub fn decode_from_file(&self, path: impl AsRef<Path>) -> Result<Gltf<GltfParser>, Err> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Err::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        self.decode(&bytes, path.parent())
    }

    /// Loads an asset held in memory. Only embedded and GLB buffers can be resolved.
    pub fn decode_from_slice(&self, bytes: &[u8]) -> Result<Gltf<GltfParser>, Err> {
        self.decode(bytes, None)
    }

    fn decode(&self, bytes: &[u8], base_path: Option<&Path>) -> Result<Gltf<GltfParser>, Err> {
        let (json_bytes, blob) = if bytes.starts_with(b"glTF") {
            let glb = gltf::Glb::from_slice(bytes)
                .map_err(|e| Err::LoadError(format!("Failed to parse GLB: {}", e)))?;
            (glb.json.into_owned(), glb.bin.map(|bin| bin.into_owned()))
        } else {
            (bytes.to_vec(), None)
        };

        let json: Value = serde_json::from_slice(&json_bytes)
            .map_err(|e| Err::LoadError(format!("Invalid JSON: {}", e)))?;

        // Custom attribute semantics such as `_FEATURE_ID_0` fail validation.
        let document = match gltf::Gltf::from_slice(&json_bytes) {
            Ok(gltf) => gltf.document,
            Err(e) => {
                log::debug!("glTF validation failed ({}), loading without validation", e);
                gltf::Gltf::from_slice_without_validation(&json_bytes)
                    .map_err(|e| Err::LoadError(e.to_string()))?
                    .document
            }
        };

        let buffers = gltf::import_buffers(&document, base_path, blob)
            .map_err(|e| Err::LoadError(format!("Failed to import buffers: {}", e)))?;

        let (scene, node_map) = {
            let mut builder = SceneBuilder::new(&document, &json, &buffers);
            builder.build()?;
            (builder.scene, builder.node_map)
        };
        log::debug!("decoded {} glTF nodes into {} scene nodes", node_map.len(), scene.num_nodes());

        Ok(Gltf {
            scene,
            json,
            parser: GltfParser { document, buffers, node_map },
        })
    }
}

/// Keeps the loaded document and buffers around for lookups made after decoding.
#[derive(Debug)]
pub struct GltfParser {
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
    /// glTF node index -> scene node index.
    node_map: Vec<Option<SceneNodeIdx>>,
}

impl GltfParser {
    pub fn scene_node_of(&self, gltf_node: usize) -> Option<SceneNodeIdx> {
        self.node_map.get(gltf_node).copied().flatten()
    }
}

impl AccessorLoader for GltfParser {
    async fn load_accessor(&self, index: usize) -> Option<AccessorArray> {
        let accessor = self.document.accessors().nth(index)?;
        read_accessor(&accessor, &self.buffers)
            .map_err(|e| log::warn!("Failed to load accessor {}: {}", index, e))
            .ok()
    }
}

impl DependencyResolver for GltfParser {
    async fn get_dependency(&self, node_index: usize) -> Option<SceneNodeIdx> {
        self.scene_node_of(node_index)
    }
}

struct SceneBuilder<'a> {
    document: &'a gltf::Document,
    json: &'a Value,
    buffers: &'a [gltf::buffer::Data],
    materials: HashMap<Option<usize>, Arc<Material>>,
    scene: Scene,
    node_map: Vec<Option<SceneNodeIdx>>,
}

impl<'a> SceneBuilder<'a> {
    fn new(document: &'a gltf::Document, json: &'a Value, buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            document,
            json,
            buffers,
            materials: HashMap::new(),
            scene: Scene::new(),
            node_map: vec![None; document.nodes().len()],
        }
    }

    fn build(&mut self) -> Result<(), Err> {
        let roots = match self.document.default_scene().or_else(|| self.document.scenes().next()) {
            Some(scene) => scene.nodes().map(|n| n.index()).collect::<Vec<_>>(),
            None => {
                // no scene declared: every node that is nobody's child is a root
                let mut is_child = vec![false; self.node_map.len()];
                for node in self.document.nodes() {
                    for child in node.children() {
                        is_child[child.index()] = true;
                    }
                }
                (0..is_child.len()).filter(|&i| !is_child[i]).collect()
            }
        };
        for root in roots {
            let idx = self.decode_node(root)?;
            self.scene.add_root_node_index(idx)?;
        }
        Ok(())
    }

    fn decode_node(&mut self, index: usize) -> Result<SceneNodeIdx, Err> {
        if let Some(idx) = self.node_map.get(index).copied().flatten() {
            return Ok(idx);
        }
        let node = self.document.nodes().nth(index).ok_or(Err::MissingNode(index))?;
        let json = self.json;
        let raw = &json["nodes"][index];
        let extensions = extensions_of(raw);

        let mut object = Object3d::new(node.name().unwrap_or_default());
        object.trs = node_trs(&node);
        object.user_data = raw.get("extras").cloned().unwrap_or_default();

        let mut primitive_objects = match node.mesh() {
            Some(mesh) => {
                let instancing = extensions.get(ExtensionName::MeshGpuInstancing.as_str());
                self.decode_mesh(&node, &mesh, instancing)?
            },
            None => Vec::new(),
        };
        let scene_object = if primitive_objects.len() == 1 {
            let mut single = primitive_objects.remove(0);
            *single.object_mut() = object;
            single
        } else {
            SceneObject::Group(object)
        };

        let idx = self.scene.add_node(
            SceneNode::new(scene_object)
                .with_extensions(extensions)
                .with_gltf_node_index(index)
        );
        self.node_map[index] = Some(idx);

        for primitive_object in primitive_objects {
            let child = self.scene.add_node(SceneNode::new(primitive_object).with_gltf_node_index(index));
            self.scene.add_child(idx, child)?;
        }
        for child in node.children() {
            let child = self.decode_node(child.index())?;
            self.scene.add_child(idx, child)?;
        }
        Ok(idx)
    }

    /// Returns one object per primitive of `mesh`.
    fn decode_mesh(&mut self, node: &gltf::Node, mesh: &gltf::Mesh, instancing: Option<&Value>) -> Result<Vec<SceneObject>, Err> {
        let json = self.json;
        let raw_mesh = &json["meshes"][mesh.index()];
        let influences = node.weights().or(mesh.weights()).map(<[f32]>::to_vec).unwrap_or_default();
        let dictionary = raw_mesh["extras"]["targetNames"].as_array()
            .map(|names| {
                names.iter()
                    .filter_map(Value::as_str)
                    .enumerate()
                    .map(|(i, name)| (name.to_owned(), i))
                    .collect::<IndexMap<_, _>>()
            })
            .unwrap_or_default();
        let instance_matrix = match instancing {
            Some(ext) => self.decode_instance_matrices(ext)?,
            None => None,
        };

        let mut objects = Vec::with_capacity(mesh.primitives().len());
        for primitive in mesh.primitives() {
            let raw_primitive = &raw_mesh["primitives"][primitive.index()];
            let geometry = self.decode_geometry(&primitive, raw_primitive, mesh.index())?;
            let material = self.material(primitive.material());
            let extensions = extensions_of(raw_primitive);
            let object = Object3d::new(mesh.name().unwrap_or_default());

            let scene_object = if let Some(instance_matrix) = &instance_matrix {
                let geometry = Arc::new(geometry);
                let mut instanced = InstancedMesh::new(object, geometry.clone(), material, instance_matrix.clone());
                instanced.bounding_box = geometry.compute_bounding_box();
                instanced.bounding_sphere = geometry.compute_bounding_sphere();
                instanced.morph_target_influences = influences.clone();
                instanced.morph_target_dictionary = dictionary.clone();
                instanced.extensions = extensions;
                SceneObject::InstancedMesh(instanced)
            } else if primitive.mode() == Mode::Triangles {
                let mut triangles = Mesh::new(object, geometry, material).with_extensions(extensions);
                triangles.morph_target_influences = influences.clone();
                triangles.morph_target_dictionary = dictionary.clone();
                SceneObject::Mesh(triangles)
            } else {
                log::debug!("mesh {} primitive {} has mode {:?}; kept as points", mesh.index(), primitive.index(), primitive.mode());
                SceneObject::Points(Points {
                    object,
                    geometry: Arc::new(geometry),
                    material,
                    extensions,
                })
            };
            objects.push(scene_object);
        }
        Ok(objects)
    }

    fn decode_geometry(&self, primitive: &gltf::Primitive, raw_primitive: &Value, mesh: usize) -> Result<Geometry, Err> {
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions = reader.read_positions()
            .ok_or(Err::MissingPositions { mesh, primitive: primitive.index() })?
            .collect();
        let mut geometry = Geometry::new(positions);
        if let Some(normals) = reader.read_normals() {
            geometry = geometry.with_normals(normals.collect());
        }
        if let Some(indices) = reader.read_indices() {
            geometry = geometry.with_indices(indices.into_u32().collect());
        }

        // Application-specific attributes (leading underscore) are read from the raw JSON.
        if let Some(attributes) = raw_primitive["attributes"].as_object() {
            for (name, accessor) in attributes {
                let Some(accessor) = accessor.as_u64().filter(|_| name.starts_with('_')) else {
                    continue;
                };
                let data = read_accessor(&self.accessor(accessor as usize)?, self.buffers)?;
                geometry.set_attribute(name, data);
            }
        }
        Ok(geometry)
    }

    /// Builds one transform per instance from the `TRANSLATION`, `ROTATION` and `SCALE`
    /// accessors. A malformed extension is logged and the node is loaded uninstanced.
    fn decode_instance_matrices(&self, ext: &Value) -> Result<Option<Vec<Matrix4d>>, Err> {
        let ext = match ExtMeshGpuInstancing::from_json(ext) {
            Ok(ext) => ext,
            Err(e) => {
                log::warn!("Ignoring malformed EXT_mesh_gpu_instancing: {}", e);
                return Ok(None);
            }
        };
        let translation = self.read_instance_attribute(&ext, "TRANSLATION")?;
        let rotation = self.read_instance_attribute(&ext, "ROTATION")?;
        let scale = self.read_instance_attribute(&ext, "SCALE")?;

        let count = [
            translation.as_ref().map_or(0, |t| t.len() / 3),
            rotation.as_ref().map_or(0, |r| r.len() / 4),
            scale.as_ref().map_or(0, |s| s.len() / 3),
        ].into_iter().max().unwrap_or(0);

        let matrices: Vec<Matrix4d> = (0..count)
            .map(|i| {
                let t = translation.as_ref().and_then(|t| t.get(i * 3..i * 3 + 3))
                    .map_or(Vector3d::ZERO, |t| Vector3d::from([t[0], t[1], t[2]]));
                let r = rotation.as_ref().and_then(|r| r.get(i * 4..i * 4 + 4))
                    .map_or(Quaterniond::IDENTITY, |r| Quaterniond::from_xyzw([r[0], r[1], r[2], r[3]]));
                let s = scale.as_ref().and_then(|s| s.get(i * 3..i * 3 + 3))
                    .map_or(Vector3d::ONE, |s| Vector3d::from([s[0], s[1], s[2]]));
                Matrix4d::from_trs(t, r, s)
            })
            .collect();
        Ok(Some(matrices))
    }

    fn read_instance_attribute(&self, ext: &ExtMeshGpuInstancing, name: &str) -> Result<Option<Vec<f32>>, Err> {
        let Some(index) = ext.accessor(name) else {
            return Ok(None);
        };
        let accessor = self.accessor(index)?;
        let data = read_accessor(&accessor, self.buffers)?;
        Ok(Some(if accessor.normalized() { data.to_normalized_f32() } else { data.to_f32() }))
    }

    fn accessor(&self, index: usize) -> Result<gltf::Accessor<'a>, Err> {
        self.document.accessors().nth(index).ok_or(Err::MissingAccessor(index))
    }

    /// Materials are shared by every primitive that references them.
    fn material(&mut self, material: gltf::Material) -> Arc<Material> {
        self.materials.entry(material.index())
            .or_insert_with(|| {
                let mut out = Material::new();
                if let Some(name) = material.name() {
                    out.set_name(name);
                }
                let pbr = material.pbr_metallic_roughness();
                out.set_color_factor(pbr.base_color_factor());
                out.set_metallic_factor(pbr.metallic_factor());
                out.set_roughness_factor(pbr.roughness_factor());
                out.set_double_sided(material.double_sided());
                Arc::new(out)
            })
            .clone()
    }
}

fn extensions_of(raw: &Value) -> Extensions {
    raw.get("extensions")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn node_trs(node: &gltf::Node) -> TrsMatrix {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => TrsMatrix::Matrix(Matrix4d::from_column_major(matrix)),
        gltf::scene::Transform::Decomposed { translation, rotation, scale } => TrsMatrix::Decomposed {
            translation: translation.into(),
            rotation: Quaterniond::from_xyzw(rotation),
            scale: scale.into(),
        },
    }
}
