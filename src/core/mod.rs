/// Shared aliases and traits.
pub mod shared;

/// Typed numeric buffers resolved from glTF accessors.
pub mod accessor;

/// Serde shapes of the feature and instancing extensions.
pub mod extension;

/// Vertex/index buffers of a single drawable.
pub mod geometry;

pub mod material;

/// Scene graph and the drawable objects it holds.
pub mod scene;
