use std::collections::HashMap;
use std::sync::Arc;

use crate::core::extension::FeatureIdSet;
use crate::core::geometry::Geometry;
use crate::core::material::Material;
use crate::core::scene::batched::BatchedMesh;
use crate::core::shared::total_len;
use super::{Err, FeatureInfo, FeatureInfos};

/// Repacks `geometry` into one compact sub-geometry per feature and collects them in a
/// `BatchedMesh`, one draw unit per feature. Sub-geometries are added in the order of
/// `feature_infos`.
pub fn create_batched_mesh(
    feature_infos: &FeatureInfos,
    feature_id_set: &FeatureIdSet,
    geometry: &Geometry,
    material: Arc<Material>,
) -> Result<BatchedMesh, Err> {
    if feature_infos.is_empty() {
        return Err(Err::EmptyFeatureInfos);
    }
    if feature_infos.len() != feature_id_set.feature_count as usize {
        return Err(Err::FeatureCountMismatch {
            expected: feature_id_set.feature_count,
            found: feature_infos.len(),
        });
    }

    let indices = geometry.indices().ok_or(Err::MissingIndices)?;
    let positions = geometry.positions();
    let normals = geometry.normals();
    if let Some(normals) = normals {
        if normals.len() != positions.len() {
            return Err(Err::NormalCountMismatch { normals: normals.len(), vertices: positions.len() });
        }
    }

    let sub_geometries = feature_infos.values()
        .map(|info| compact_feature(info, positions, normals, indices))
        .collect::<Result<Vec<_>, _>>()?;

    let max_vertex_count = sub_geometries.iter().map(|g| g.vertex_count()).sum();
    let max_index_count = sub_geometries.iter().map(|g| g.index_count()).sum();
    let mut batched = BatchedMesh::new(sub_geometries.len(), max_vertex_count, max_index_count, material);
    for (info, sub_geometry) in feature_infos.values().zip(sub_geometries) {
        let geometry_id = batched.add_geometry(sub_geometry)?;
        batched.add_instance(geometry_id)?;
        batched.set_feature_geometry(info.feature_id, geometry_id);
    }
    batched.set_feature_id_set(feature_id_set.clone());
    Ok(batched)
}

/// Copies every vertex referenced by the feature's index sections exactly once and
/// rewrites the indices to point into the copy.
fn compact_feature(
    info: &FeatureInfo,
    positions: &[[f32; 3]],
    normals: Option<&[[f32; 3]]>,
    indices: &[u32],
) -> Result<Geometry, Err> {
    let vertex_count = total_len(&info.vertex_sections);
    let index_count = total_len(&info.index_sections);

    let mut out_positions = Vec::with_capacity(vertex_count);
    let mut out_normals = normals.map(|_| Vec::with_capacity(vertex_count));
    let mut out_indices = Vec::with_capacity(index_count);

    // original index -> local index, scoped to this feature
    let mut remap: HashMap<u32, u32> = HashMap::with_capacity(vertex_count);

    for section in &info.index_sections {
        let section_indices = indices.get(section.clone())
            .ok_or(Err::SectionOutOfRange { start: section.start, end: section.end, len: indices.len() })?;
        for &index in section_indices {
            let local = match remap.get(&index) {
                Some(&local) => local,
                None => {
                    let i = index as usize;
                    let position = positions.get(i)
                        .ok_or(Err::IndexOutOfRange { index, vertex_count: positions.len() })?;
                    out_positions.push(*position);
                    if let (Some(src), Some(dst)) = (normals, out_normals.as_mut()) {
                        dst.push(src[i]);
                    }
                    let local = (out_positions.len() - 1) as u32;
                    remap.insert(index, local);
                    local
                }
            };
            out_indices.push(local);
        }
    }

    let mut geometry = Geometry::new(out_positions).with_indices(out_indices);
    if let Some(normals) = out_normals {
        geometry = geometry.with_normals(normals);
    }
    Ok(geometry)
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::shared::FeatureId;
    use crate::features::{attribution::count_indices, segment::count_vertices};

    fn build(positions: Vec<[f32; 3]>, indices: Vec<u32>, feature_ids: &[FeatureId], feature_count: u32) -> Result<BatchedMesh, Err> {
        let normals = positions.iter().map(|p| [p[0], -p[1], 1.0]).collect();
        let geometry = Geometry::new(positions).with_normals(normals).with_indices(indices);
        let mut infos = count_vertices(feature_ids)?;
        count_indices(geometry.indices().unwrap(), feature_ids, &mut infos)?;
        let set = FeatureIdSet::new(feature_count, 0);
        create_batched_mesh(&infos, &set, &geometry, Arc::new(Material::new()))
    }

    /// A strip of quads; each quad owns its four vertices. Neighbouring quads touch
    /// in x/y, so z carries the vertex index to keep every vertex distinct.
    fn strip(feature_ids_per_quad: &[FeatureId]) -> (Vec<[f32; 3]>, Vec<u32>, Vec<FeatureId>) {
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        let mut feature_ids = Vec::new();
        for (q, &id) in feature_ids_per_quad.iter().enumerate() {
            let x = q as f32;
            let base = positions.len() as u32;
            let z = |k: u32| (base + k) as f32;
            positions.extend([[x, 0.0, z(0)], [x + 1.0, 0.0, z(1)], [x + 1.0, 1.0, z(2)], [x, 1.0, z(3)]]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
            feature_ids.extend([id; 4]);
        }
        (positions, indices, feature_ids)
    }

    fn triangles_of(geometry: &Geometry) -> Vec<[[u32; 3]; 3]> {
        let positions = geometry.positions();
        geometry.indices().unwrap()
            .chunks_exact(3)
            .map(|t| {
                let p = |i: u32| positions[i as usize].map(f32::to_bits);
                [p(t[0]), p(t[1]), p(t[2])]
            })
            .collect()
    }

    #[test]
    fn round_trip_keeps_triangles() {
        let (positions, indices, feature_ids) = strip(&[3, 3, 1, 3]);
        let original = Geometry::new(positions.clone()).with_indices(indices.clone());
        let batched = build(positions, indices, &feature_ids, 2).unwrap();

        let mut expected = triangles_of(&original);
        let mut actual = batched.geometries().iter().flat_map(triangles_of).collect::<Vec<_>>();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn shared_vertices_are_copied_once() {
        let (positions, indices, feature_ids) = strip(&[3, 3, 1, 3]);
        let batched = build(positions, indices, &feature_ids, 2).unwrap();

        // feature 3 owns quads 0, 1, 3 -> 12 distinct vertices referenced by 18 indices
        let g = batched.geometry(batched.geometry_for_feature(3).unwrap()).unwrap();
        assert_eq!(g.vertex_count(), 12);
        assert_eq!(g.index_count(), 18);
        let distinct = g.positions().iter().map(|p| p.map(f32::to_bits)).collect::<HashSet<_>>();
        assert_eq!(distinct.len(), g.vertex_count());
        // z holds the source vertex index: quads 0, 1 and 3 in order
        let sources = g.positions().iter().map(|p| p[2] as u32).collect::<Vec<_>>();
        assert_eq!(sources, [0, 1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 15]);
        // normals follow their vertices
        for (p, n) in g.positions().iter().zip(g.normals().unwrap()) {
            assert_eq!(*n, [p[0], -p[1], 1.0]);
        }
    }

    #[test]
    fn single_feature_holds_the_whole_mesh() {
        let (positions, indices, feature_ids) = strip(&[5, 5]);
        let batched = build(positions.clone(), indices.clone(), &feature_ids, 1).unwrap();
        assert_eq!(batched.num_geometries(), 1);
        let g = &batched.geometries()[0];
        assert_eq!(g.positions(), &positions[..]);
        assert_eq!(g.indices(), Some(&indices[..]));
    }

    #[test]
    fn local_indices_restart_per_feature() {
        let (positions, indices, feature_ids) = strip(&[1, 2]);
        let batched = build(positions, indices, &feature_ids, 2).unwrap();
        for g in batched.geometries() {
            assert_eq!(g.indices(), Some(&[0, 1, 2, 0, 2, 3][..]));
        }
    }

    #[test]
    fn precondition_errors() {
        let geometry = Geometry::new(vec![[0.0; 3]; 3]).with_indices(vec![0, 1, 2]);
        let material = Arc::new(Material::new());
        assert_eq!(
            create_batched_mesh(&FeatureInfos::new(), &FeatureIdSet::new(0, 0), &geometry, material.clone()).unwrap_err(),
            Err::EmptyFeatureInfos
        );

        let (positions, indices, feature_ids) = strip(&[1, 2]);
        assert_eq!(
            build(positions, indices, &feature_ids, 3).unwrap_err(),
            Err::FeatureCountMismatch { expected: 3, found: 2 }
        );

        let geometry = Geometry::new(vec![[0.0; 3]; 3])
            .with_normals(vec![[0.0; 3]; 2])
            .with_indices(vec![0, 1, 2]);
        let mut infos = count_vertices(&[0, 0, 0]).unwrap();
        count_indices(&[0, 1, 2], &[0, 0, 0], &mut infos).unwrap();
        assert_eq!(
            create_batched_mesh(&infos, &FeatureIdSet::new(1, 0), &geometry, material).unwrap_err(),
            Err::NormalCountMismatch { normals: 2, vertices: 3 }
        );
    }

    #[test]
    fn geometry_without_normals() {
        let (positions, indices, feature_ids) = strip(&[1, 2]);
        let geometry = Geometry::new(positions).with_indices(indices);
        let mut infos = count_vertices(&feature_ids).unwrap();
        count_indices(geometry.indices().unwrap(), &feature_ids, &mut infos).unwrap();
        let batched = create_batched_mesh(&infos, &FeatureIdSet::new(2, 0), &geometry, Arc::new(Material::new())).unwrap();
        assert!(batched.geometries().iter().all(|g| g.normals().is_none()));
    }
}
