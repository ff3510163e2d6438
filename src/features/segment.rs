use crate::core::shared::{FeatureId, Section};
use super::{Err, FeatureInfo, FeatureInfos};

/// Splits the per-vertex feature ID array into runs of equal IDs and records each
/// run as a vertex section of its feature. Runs of the same ID that are not adjacent
/// stay separate sections.
pub fn count_vertices(feature_ids: &[FeatureId]) -> Result<FeatureInfos, Err> {
    let mut last_feature_id = *feature_ids.first().ok_or(Err::EmptyFeatureIds)?;

    let mut feature_infos = FeatureInfos::new();
    let mut current_section_vertex_count = 0;
    for (j, &feature_id) in feature_ids.iter().enumerate() {
        if feature_id != last_feature_id {
            push_vertex_section(&mut feature_infos, last_feature_id, j - current_section_vertex_count..j);
            current_section_vertex_count = 0;
            last_feature_id = feature_id;
        }
        current_section_vertex_count += 1;
    }

    // trailing run
    let len = feature_ids.len();
    push_vertex_section(&mut feature_infos, last_feature_id, len - current_section_vertex_count..len);
    Ok(feature_infos)
}

fn push_vertex_section(feature_infos: &mut FeatureInfos, feature_id: FeatureId, section: Section) {
    feature_infos
        .entry(feature_id)
        .or_insert_with(|| FeatureInfo::new(feature_id))
        .vertex_sections
        .push(section);
}
