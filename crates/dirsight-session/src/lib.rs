/// DirSight Session — the controlling context for one browsing session.
///
/// Business logic lives in `dirsight-core`; this crate wires navigation to
/// background scans and hands completed results back to the caller.
pub mod state;

pub use state::{Session, SessionPhase};
