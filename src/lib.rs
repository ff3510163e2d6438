// lib.rs

/// Contains the interface between glTF assets and the in-memory `Scene`.
pub mod io;

/// Contains the scene graph, geometry, and extension definitions.
pub mod core;

/// Feature segmentation, geometry rebatching, and instance feature mapping.
pub mod features;

/// Scene-level entry points that decide which nodes get batched and how.
pub mod toolkit;


/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::core::shared::{ConfigType, FeatureId, Section};
    pub use crate::core::accessor::AccessorArray;
    pub use crate::core::extension::{ExtMeshFeatures, ExtMeshGpuInstancing, FeatureIdSet};
    pub use crate::core::geometry::Geometry;
    pub use crate::core::scene::{Scene, SceneNode, SceneObject, Object3d};
    pub use crate::core::scene::batched::{BatchedMesh, GeometryId};
    pub use crate::core::scene::instanced::{InstancedMesh, InstancedFeatureMesh};
    pub use crate::core::scene::mesh::Mesh;
    pub use crate::toolkit::{
        self,
        has_features,
        parse_mesh_features,
        AccessorLoader,
        Config,
        DependencyResolver,
        Gltf,
        ParsedScene,
    };
    pub use crate::toolkit::report::{FeatureReport, NodeOutcome, Outcome, SkipReason};
}
