//! Data models
//!
//! This module contains the data structures shared by the stores, services and API:
//! - Sessions with their rate-limit counters
//! - Uploaded images
//! - Analysis records produced by the provider

mod analysis;
mod image;
mod session;

pub use analysis::{AnalysisKind, AnalysisRecord, AnalysisResult, AnalysisStatus, GeneratedImage};
pub use image::{ImageDimensions, StoredImage, UploadInput, UploadedImageInfo};
pub use session::{next_minute_boundary, RateLimitCounter, RateLimitKind, RateLimits, Session};
