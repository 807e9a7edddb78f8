// The analysis layer: indicators feed the checklist, the checklist verdict
// feeds the plan builder, clusters add confluence on top.
pub mod checklist;
pub mod clusters;
pub mod indicators;
pub mod plan;

pub use checklist::{CheckResult, ChecklistVerdict, evaluate};
pub use clusters::{Cluster, ClusterBook};
pub use plan::{Levels, Plan, build_plan, nearest_levels, tp_reached};
