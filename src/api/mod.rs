pub mod info;
pub mod models;

pub use info::*;
pub use models::*;
