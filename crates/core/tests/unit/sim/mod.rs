/// JSON machine images.
pub mod loader;

/// Stage timing and the run loop.
pub mod timing;
