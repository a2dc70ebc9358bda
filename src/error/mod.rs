//! Unified error handling for sift.
//!
//! - **Error Categories**: high-level classification for handling decisions
//! - **Domain-specific Errors**: stream (SSE), filter (compiler) and network
//! - **Unified Error Type**: `SiftError` consolidates the domain errors
//! - **Error Context**: operation, component and URL of a failure
//! - **Result Type Alias**: `SiftResult<T>`
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, read and write failures | Yes |
//! | Server | 5xx, wrong content type, slow drain | Yes |
//! | Client | API misuse | No |
//! | User | Invalid filter text or request | No |
//! | Configuration | Unusable sink or URL | No |

mod category;
mod context;
mod filter;
mod network;
mod result;
mod sift_error;
mod stream;

pub use category::ErrorCategory;
pub use context::ErrorContext;
pub use filter::FilterError;
pub use network::{classify_reqwest_error, NetworkError};
pub use result::{ResultExt, SiftResult};
pub use sift_error::SiftError;
pub use stream::StreamError;
