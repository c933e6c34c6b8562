//! Services layer - Business logic
//!
//! Services own the validation rules and coordinate the repositories and the
//! analysis provider. Each service has its own error enum; the API layer maps
//! those onto HTTP responses.

pub mod analysis;
pub mod export;
pub mod history;
pub mod rate_limiter;
pub mod session;
pub mod upload;
pub mod validation;

pub use analysis::{AnalysisError, AnalysisOutcome, AnalysisService, ValidatedRequest};
pub use export::{ExportDocument, ExportFormat};
pub use history::{HistoryError, HistoryPage, HistoryService};
pub use rate_limiter::{RateLimitOutcome, RateLimitSnapshot, RateLimiter};
pub use session::{SessionError, SessionService, SweepReport};
pub use upload::{UploadError, UploadOutcome, UploadService};
pub use validation::{is_valid_uuid, parse_uuid};
