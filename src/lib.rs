#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod array;
pub mod coord;
pub mod datatypes;
pub mod error;
pub mod sequence;
pub mod wkb;

pub use sequence::Sequence;
