//! Resolution of playable stream URLs from anime watch pages and IPTV channels.
//!
//! The entry point is [`extractor::StreamResolver`], which fetches a watch
//! page (falling back to mirror domains), runs every extraction strategy over
//! it, follows alternate-player pages and returns a ranked, deduplicated list
//! of [`media::StreamDescriptor`]s ready to hand to a player.

pub mod channels;
pub mod config;
pub mod download;
pub mod extractor;
pub mod media;
pub mod proxy;

#[cfg(test)]
pub(crate) mod test_utils;

pub use channels::{ChannelCatalog, ChannelSources};
pub use config::{DomainConfig, ResolverConfig};
pub use extractor::platforms::{AnimeSaturn, VavooClient, VavooCredentials};
pub use extractor::{ExtractorError, StreamResolver};
pub use media::{StreamCandidate, StreamCategory, StreamDescriptor};
pub use proxy::MediaFlowProxy;
