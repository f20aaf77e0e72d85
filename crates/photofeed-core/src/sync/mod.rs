// ── Synchronizers ──
//
// Each synchronizer owns one slice of session state, admits remote work
// through a `RequestGuard`, and announces changes on the `ChangeBus`.

pub mod feed;
pub mod profile;
pub mod reset;
pub mod token;

pub use feed::{FeedSynchronizer, LoadOutcome, PrefetchPolicy};
pub use profile::ProfileSynchronizer;
pub use reset::SessionReset;
pub use token::TokenSession;
