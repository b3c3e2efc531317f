//! Utils Module
pub mod logging;
pub mod retry;
pub mod truncate;

pub use logging::{init_logging, LogGuard};
pub use retry::RetryPolicy;
pub use truncate::{clip, tail};
