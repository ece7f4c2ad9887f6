pub mod builder;
pub mod classifier;
pub mod default;
pub mod error;
pub mod fetcher;
pub mod platforms;
pub mod probe;
pub mod resolver;
pub mod strategies;
pub mod utils;

pub use builder::DescriptorBuilder;
pub use classifier::{CandidateSet, classify};
pub use default::{DEFAULT_UA, default_client};
pub use error::ExtractorError;
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use probe::{probe, retain_reachable};
pub use resolver::StreamResolver;
