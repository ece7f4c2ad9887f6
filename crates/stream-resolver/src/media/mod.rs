pub mod candidate;
pub mod stream_category;
pub mod stream_descriptor;

pub use candidate::{SourceStrategy, StreamCandidate};
pub use stream_category::{MediaExtension, StreamCategory};
pub use stream_descriptor::StreamDescriptor;
