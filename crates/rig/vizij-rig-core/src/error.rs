use thiserror::Error;

/// Problems found while assembling or validating rig data.
#[derive(Debug, Error, PartialEq)]
pub enum RigError {
    #[error("bone {bone} ('{name}') has parent {parent}, which does not precede it")]
    ParentOrder {
        bone: usize,
        name: String,
        parent: usize,
    },
    #[error("model describes {descriptors} bones but the skeleton has {bones}")]
    DescriptorCount { descriptors: usize, bones: usize },
    #[error("bone descriptor at position {position} describes bone {index}")]
    DescriptorIndex { position: usize, index: usize },
    #[error("grant {grant} makes bone {bone} its own source")]
    SelfGrant { grant: usize, bone: usize },
    #[error("{what} {index} references bone {bone}, but the skeleton has {len} bones")]
    BoneOutOfRange {
        what: &'static str,
        index: usize,
        bone: usize,
        len: usize,
    },
    #[error("bone descriptor {bone} references {what} {reference}, which targets bone {target}")]
    MismatchedReference {
        bone: usize,
        what: &'static str,
        reference: usize,
        target: usize,
    },
    #[error("{what} {index} targets bone {target}, whose descriptor does not reference it")]
    UnreferencedTarget {
        what: &'static str,
        index: usize,
        target: usize,
    },
    #[error("bone descriptor {index} references missing {what} {reference}")]
    DanglingReference {
        index: usize,
        what: &'static str,
        reference: usize,
    },
}
