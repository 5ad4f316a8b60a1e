//! Service-layer monitoring: declarative timing markers, the policy that
//! resolves them, and the interceptor that wraps every service call with
//! entry/exit logging.

mod interceptor;
mod marker;
mod policy;
mod summary;

pub use interceptor::Interceptor;
pub use marker::{Component, Operation};
pub use policy::{MarkerLevel, TimingPolicy, TimingPolicyBuilder};
pub use summary::{ArgSummary, MAX_ARGUMENT_LOG_LENGTH, TRUNCATION_MARKER, bound, summarize};
