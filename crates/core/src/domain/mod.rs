pub mod installation;
pub mod scan;

// Re-exports for convenience
pub use installation::*;
pub use scan::*;
