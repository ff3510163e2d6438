/// Loads glTF 2.0 assets (`.gltf` and `.glb`) into a `Scene`.
pub mod gltf;
