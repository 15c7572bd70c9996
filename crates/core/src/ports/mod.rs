pub mod env;
pub mod link;
pub mod registry;
pub mod validator;

// Re-exports
pub use env::*;
pub use link::*;
pub use registry::*;
pub use validator::*;
