pub mod cover;
pub mod summary;

pub use cover::{Cover, CoverInterval};
pub use summary::{SummaryGraph, SummaryLink, SummaryNode};

pub use topograph_core::{Result, TopographError};
