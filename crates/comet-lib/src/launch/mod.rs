pub mod invocation;
pub mod orchestrator;
/// Launch pipeline: requirement planning, invocation building, process
/// supervision and working-directory scoping.
pub mod types;
pub mod workdir;

// Re-export commonly used items
pub use invocation::{build_invocation, requirement_bundles};
pub use orchestrator::Orchestrator;
pub use types::{LaunchInvocation, LaunchOutcome, OsType, RunPhase};
pub use workdir::WorkdirGuard;
