pub mod archive_unpack;
pub mod goanywhere;
pub mod http;
pub mod parsers;
pub mod sources;
pub mod staging;
pub mod traits;
pub mod viewstate;

pub use traits::{all_sources, by_tag, PendingSpatialProduction, RunOptions, SourceAdapter, SourceBatch};
