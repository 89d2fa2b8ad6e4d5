pub mod cycle_guard;
pub mod schedule_dag;
pub mod store;

pub use cycle_guard::would_create_cycle;
pub use schedule_dag::{DagLink, DagNode, ScheduleDag};
pub use store::GraphStore;
