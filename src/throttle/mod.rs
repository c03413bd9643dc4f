pub mod rate_limit;
pub mod retry;

pub use rate_limit::RateLimiter;
pub use retry::{RetryPolicy, RetryingCaller};
