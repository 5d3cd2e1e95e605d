pub mod centrality;
pub mod filter;
pub mod local;
pub mod metrics;
pub mod network;
pub mod traits;

pub use filter::FilterProfile;
pub use local::{LocalBackend, SourceKind};
pub use network::build_network;
pub use traits::AnalysisBackend;
