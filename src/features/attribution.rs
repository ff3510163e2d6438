use crate::core::shared::{FeatureId, Section};
use super::{Err, FeatureInfos};

/// A triangle whose three vertices carry different feature IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedTriangle {
    /// Triangle number, i.e. the offset into the index array divided by 3.
    pub triangle: usize,
    pub feature_ids: [FeatureId; 3],
}

/// Walks the index array one triangle at a time and appends index sections to
/// `feature_infos`. A triangle belongs to the feature of its first vertex.
pub fn count_indices(indices: &[u32], feature_ids: &[FeatureId], feature_infos: &mut FeatureInfos) -> Result<(), Err> {
    if indices.is_empty() {
        return Err(Err::EmptyIndices);
    }
    if feature_ids.is_empty() {
        return Err(Err::EmptyFeatureIds);
    }
    if indices.len() % 3 != 0 {
        return Err(Err::IndexCountNotTriangles(indices.len()));
    }

    let mut last_feature_id = feature_id_of(feature_ids, indices[0])?;
    let mut current_section_index_count = 3;
    for j in (3..indices.len()).step_by(3) {
        let feature_id = feature_id_of(feature_ids, indices[j])?;
        if feature_id != last_feature_id {
            push_index_section(feature_infos, last_feature_id, j - current_section_index_count..j)?;
            current_section_index_count = 0;
            last_feature_id = feature_id;
        }
        current_section_index_count += 3;
    }

    // trailing run
    let len = indices.len();
    push_index_section(feature_infos, last_feature_id, len - current_section_index_count..len)
}

/// Lists every triangle whose vertices disagree on the feature ID.
pub fn find_mixed_triangles(indices: &[u32], feature_ids: &[FeatureId]) -> Result<Vec<MixedTriangle>, Err> {
    let mut out = Vec::new();
    for (triangle, face) in indices.chunks_exact(3).enumerate() {
        let ids = [
            feature_id_of(feature_ids, face[0])?,
            feature_id_of(feature_ids, face[1])?,
            feature_id_of(feature_ids, face[2])?,
        ];
        if ids[0] != ids[1] || ids[0] != ids[2] {
            out.push(MixedTriangle { triangle, feature_ids: ids });
        }
    }
    Ok(out)
}

fn feature_id_of(feature_ids: &[FeatureId], index: u32) -> Result<FeatureId, Err> {
    feature_ids.get(index as usize)
        .copied()
        .ok_or(Err::IndexOutOfRange { index, vertex_count: feature_ids.len() })
}

fn push_index_section(feature_infos: &mut FeatureInfos, feature_id: FeatureId, section: Section) -> Result<(), Err> {
    feature_infos
        .get_mut(&feature_id)
        .ok_or(Err::UnknownFeatureId(feature_id))?
        .index_sections
        .push(section);
    Ok(())
}
