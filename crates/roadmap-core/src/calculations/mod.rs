pub mod backward_pass;
pub mod critical_path;
pub mod forward_pass;
pub mod progress;
pub mod status;

pub use backward_pass::{BackwardPass, BackwardSchedule};
pub use critical_path::{CriticalPath, SlackAnalysis, analyze};
pub use forward_pass::{ForwardPass, ForwardSchedule};
pub use progress::rollup;
pub use status::{StatusSummary, TaskStatus};
