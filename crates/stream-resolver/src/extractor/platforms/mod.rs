pub mod animesaturn;
pub mod vavoo;

pub use animesaturn::AnimeSaturn;
pub use vavoo::{VavooClient, VavooCredentials};
