pub mod client;
pub mod host;
pub mod rate_limiter;
pub mod url;

pub use client::GitHubClient;
pub use host::RepositoryHost;
pub use rate_limiter::{RateLimitSnapshot, RateLimitTracker};
pub use url::parse_repository_url;
