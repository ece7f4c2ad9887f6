mod builder;
mod models;

pub use builder::{PLAYER_USER_AGENT, VavooClient, VavooCredentials, normalize_channel_name, pick_channel};
pub use models::CatalogItem;
