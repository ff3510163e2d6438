use indexmap::IndexMap;

use super::accessor::AccessorArray;
use super::extension::feature_id_attribute_name;

/// Position, normal, and index buffers of one drawable together with any custom
/// per-vertex attributes (e.g. `_feature_id_0`). Custom attribute names are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    indices: Option<Vec<u32>>,
    attributes: IndexMap<String, AccessorArray>,
}

impl Geometry {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_attribute(mut self, name: &str, data: AccessorArray) -> Self {
        self.set_attribute(name, data);
        self
    }

    pub fn set_attribute(&mut self, name: &str, data: AccessorArray) {
        self.attributes.insert(name.to_lowercase(), data);
    }

    pub fn get_attribute(&self, name: &str) -> Option<&AccessorArray> {
        self.attributes.get(&name.to_lowercase())
    }

    pub fn attributes(&self) -> &IndexMap<String, AccessorArray> {
        &self.attributes
    }

    /// The `_feature_id_<attribute>` array, if the geometry carries one.
    pub fn feature_id_array(&self, attribute: u32) -> Option<&AccessorArray> {
        self.get_attribute(&feature_id_attribute_name(attribute))
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, |i| i.len())
    }

    /// Returns the axis-aligned bounding box of the positions, or `None` for an empty geometry.
    pub fn compute_bounding_box(&self) -> Option<BoundingBox> {
        let first = *self.positions.first()?;
        let mut bbox = BoundingBox { min: first, max: first };
        for p in &self.positions[1..] {
            for k in 0..3 {
                bbox.min[k] = bbox.min[k].min(p[k]);
                bbox.max[k] = bbox.max[k].max(p[k]);
            }
        }
        Some(bbox)
    }

    /// Returns a sphere centered on the bounding box that encloses every position.
    pub fn compute_bounding_sphere(&self) -> Option<BoundingSphere> {
        let center = self.compute_bounding_box()?.center();
        let radius = self.positions.iter()
            .map(|p| {
                let d = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0f32, f32::max);
        Some(BoundingSphere { center, radius })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}
