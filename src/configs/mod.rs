pub mod base;
pub mod server;
pub mod sources;

pub use base::*;
pub use server::*;
pub use sources::*;
