//! Core data types shared by the retrieval and turn pipeline.

pub mod fragment;
pub mod turn;

pub use fragment::{Fragment, FragmentKind};
pub use turn::Turn;
