mod gateway_ref;
pub mod signature;

use chrono::{DateTime, SubsecRound, Utc};
pub use gateway_ref::new_gateway_ref;
pub use signature::{canonicalize, sign, strip_hash_fields, verify};

/// The current time, truncated to whole seconds.
///
/// Every timestamp the engine stores goes through here (or is supplied by the caller at the same precision) so that
/// the textual timestamps in the database compare in chronological order.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
