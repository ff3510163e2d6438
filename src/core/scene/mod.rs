pub mod transform;
pub mod mesh;
pub mod batched;
pub mod instanced;

use serde_json::{Map, Value};

use crate::core::extension::ExtensionName;
use crate::core::shared::SceneNodeIdx;
use self::batched::BatchedMesh;
use self::instanced::{InstancedFeatureMesh, InstancedMesh};
use self::mesh::{Mesh, Points};
pub use self::transform::{Matrix4d, Quaterniond, TrsMatrix, Vector3d};

/// Raw extension objects keyed by extension name, as found in the glTF JSON.
pub type Extensions = Map<String, Value>;

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Err {
    #[error("Scene node index out of range: the index {0} is greater than the number of scene nodes {1}")]
    SceneNodeIndexOutOfRange(usize, usize),
}

/// Properties every scene object carries regardless of what it draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object3d {
    pub name: String,
    pub trs: TrsMatrix,
    pub user_data: Value,
}

impl Object3d {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }
}

/// What a scene node holds.
#[derive(Debug, Clone)]
pub enum SceneObject {
    Group(Object3d),
    Mesh(Mesh),
    /// Non-triangle primitive (points, lines).
    Points(Points),
    InstancedMesh(InstancedMesh),
    BatchedMesh(BatchedMesh),
    InstancedFeatureMesh(InstancedFeatureMesh),
}

impl SceneObject {
    pub fn object(&self) -> &Object3d {
        match self {
            Self::Group(o) => o,
            Self::Mesh(m) => &m.object,
            Self::Points(p) => &p.object,
            Self::InstancedMesh(m) => &m.object,
            Self::BatchedMesh(m) => &m.object,
            Self::InstancedFeatureMesh(m) => &m.mesh().object,
        }
    }

    pub fn object_mut(&mut self) -> &mut Object3d {
        match self {
            Self::Group(o) => o,
            Self::Mesh(m) => &mut m.object,
            Self::Points(p) => &mut p.object,
            Self::InstancedMesh(m) => &mut m.object,
            Self::BatchedMesh(m) => &mut m.object,
            Self::InstancedFeatureMesh(m) => m.object_mut(),
        }
    }

    /// Primitive-level extensions of the object. Groups have none.
    pub fn extensions(&self) -> Option<&Extensions> {
        match self {
            Self::Group(_) => None,
            Self::Mesh(m) => Some(&m.extensions),
            Self::Points(p) => Some(&p.extensions),
            Self::InstancedMesh(m) => Some(&m.extensions),
            Self::BatchedMesh(_) => None,
            Self::InstancedFeatureMesh(m) => Some(&m.mesh().extensions),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Group(_) => "group",
            Self::Mesh(_) => "mesh",
            Self::Points(_) => "points",
            Self::InstancedMesh(_) => "instanced mesh",
            Self::BatchedMesh(_) => "batched mesh",
            Self::InstancedFeatureMesh(_) => "instanced feature mesh",
        }
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::Group(Object3d::default())
    }
}

// A node of the scene hierarchy. Node-level glTF extensions live on the node,
// primitive-level extensions on the object it holds.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub object: SceneObject,
    pub extensions: Extensions,
    /// Index of the glTF node this scene node was created from.
    pub gltf_node_index: Option<usize>,
    parents: Vec<SceneNodeIdx>,
    children: Vec<SceneNodeIdx>,
}

impl SceneNode {
    pub fn new(object: SceneObject) -> Self {
        Self {
            object,
            ..Default::default()
        }
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_gltf_node_index(mut self, index: usize) -> Self {
        self.gltf_node_index = Some(index);
        self
    }

    pub fn get_name(&self) -> &str {
        &self.object.object().name
    }

    /// Looks an extension up on the node first, then on its object.
    pub fn find_extension(&self, name: ExtensionName) -> Option<&Value> {
        self.extensions.get(name.as_str())
            .or_else(|| self.object.extensions().and_then(|e| e.get(name.as_str())))
    }

    pub fn has_extension(&self, name: ExtensionName) -> bool {
        self.find_extension(name).is_some()
    }

    pub fn parents(&self) -> &[SceneNodeIdx] {
        &self.parents
    }

    pub fn children(&self) -> &[SceneNodeIdx] {
        &self.children
    }
}

// Holds the scene hierarchy. Nodes are stored flat and refer to each other by index.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    root_node_indices: Vec<SceneNodeIdx>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> SceneNodeIdx {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_root_node_index(&mut self, index: SceneNodeIdx) -> Result<(), Err> {
        self.check_index(index)?;
        self.root_node_indices.push(index);
        Ok(())
    }

    pub fn root_node_indices(&self) -> &[SceneNodeIdx] {
        &self.root_node_indices
    }

    pub fn add_child(&mut self, parent: SceneNodeIdx, child: SceneNodeIdx) -> Result<(), Err> {
        self.check_index(parent)?;
        self.check_index(child)?;
        self.nodes[parent].children.push(child);
        self.nodes[child].parents.push(parent);
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn get_node(&self, index: SceneNodeIdx) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    pub fn get_node_mut(&mut self, index: SceneNodeIdx) -> Option<&mut SceneNode> {
        self.nodes.get_mut(index)
    }

    /// Depth-first, pre-order walk over every node reachable from the roots.
    /// A node reachable through several parents is visited once.
    pub fn traverse(&self) -> Vec<SceneNodeIdx> {
        let mut visited = vec![false; self.nodes.len()];
        let mut out = Vec::new();
        for &root in &self.root_node_indices {
            self.traverse_impl(root, &mut visited, &mut out);
        }
        out
    }

    /// Depth-first, pre-order walk over `index` and its descendants.
    pub fn traverse_from(&self, index: SceneNodeIdx) -> Vec<SceneNodeIdx> {
        let mut visited = vec![false; self.nodes.len()];
        let mut out = Vec::new();
        self.traverse_impl(index, &mut visited, &mut out);
        out
    }

    fn traverse_impl(&self, index: SceneNodeIdx, visited: &mut [bool], out: &mut Vec<SceneNodeIdx>) {
        // explicit stack; children pushed in reverse to keep pre-order
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if i >= self.nodes.len() || visited[i] {
                continue;
            }
            visited[i] = true;
            out.push(i);
            stack.extend(self.nodes[i].children.iter().rev());
        }
    }

    fn check_index(&self, index: SceneNodeIdx) -> Result<(), Err> {
        if index >= self.nodes.len() {
            return Err(Err::SceneNodeIndexOutOfRange(index, self.nodes.len()));
        }
        Ok(())
    }
}
