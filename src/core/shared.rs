use std::ops::Range;

/// Integer label attached to a vertex or an instance.
pub type FeatureId = u32;

/// Index into `Scene::nodes`.
pub type SceneNodeIdx = usize;

/// Contiguous, end-exclusive range of a vertex or index array attributed to one feature.
pub type Section = Range<usize>;

pub trait ConfigType {
    fn default()-> Self;
}

/// Sums the lengths of the given sections.
pub(crate) fn total_len(sections: &[Section]) -> usize {
    sections.iter().map(|s| s.end - s.start).sum()
}
