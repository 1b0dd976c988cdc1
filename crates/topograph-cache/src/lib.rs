pub mod addressing;
pub mod gate;
pub mod transforms;

pub use addressing::{cache_path, CacheParams};
pub use gate::{serve_cached, store};
pub use transforms::{load_filter_values, min_max_normalize, rank_normalize};

pub use topograph_core::{Result, TopographError};
