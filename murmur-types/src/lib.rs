pub mod models;
pub mod enums;
pub mod principal;

pub use models::*;
pub use enums::*;
pub use principal::*;
