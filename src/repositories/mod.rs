//! Repositories
//!
//! Repository pattern implementations for the in-memory stores.
//! Each repository owns one map behind a `tokio::sync::RwLock`.

pub mod analysis;
pub mod image;
pub mod session;

pub use analysis::{AnalysisRepository, MemoryAnalysisRepository};
pub use image::{ImageRepository, MemoryImageRepository};
pub use session::{MemorySessionRepository, SessionRepository};
