//! Scan-and-reply workflow.

pub mod keywords;
pub mod labels;
pub mod reply;
pub mod scanner;
pub mod scheduler;

pub use keywords::KeywordSet;
pub use labels::ensure_label;
pub use reply::{ReplyOutcome, ReplyWorker};
pub use scanner::{InboxScanner, MatchResult};
pub use scheduler::{
    MIN_INTERVAL, PollScheduler, PollSettings, StartOutcome, TickReport, random_interval, run_tick,
};
