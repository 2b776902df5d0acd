pub mod analysis;
pub mod projections;
pub mod providers;
pub mod recommendation;
pub mod sync;

pub use projections::{ProjectionFeedClient, ProjectionSource};
pub use providers::{LlmStatsProvider, StatsProvider};
pub use recommendation::{analyze, analyze_batch};
