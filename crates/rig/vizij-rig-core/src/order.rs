//! Bone evaluation order for the dependency-ordered resolver.

use std::sync::Arc;

use crate::model::BoneDescriptor;

/// Bone indices sorted by (transformation class, index).
///
/// The order remembers which descriptor list it was built from; a model whose
/// list was replaced gets a fresh order.
#[derive(Clone, Debug)]
pub struct BoneOrder {
    source: Arc<[BoneDescriptor]>,
    indices: Vec<usize>,
}

impl BoneOrder {
    pub fn new(bones: &Arc<[BoneDescriptor]>) -> Self {
        let mut sorted: Vec<&BoneDescriptor> = bones.iter().collect();
        sorted.sort_by_key(|b| (b.transformation_class, b.index));
        Self {
            source: Arc::clone(bones),
            indices: sorted.into_iter().map(|b| b.index).collect(),
        }
    }

    /// Whether this order was built from exactly `bones`.
    #[inline]
    pub fn is_current(&self, bones: &Arc<[BoneDescriptor]>) -> bool {
        Arc::ptr_eq(&self.source, bones)
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}
