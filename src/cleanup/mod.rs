pub mod deleter;
pub mod pipeline;
pub mod report;
pub mod rules;

pub use deleter::{ContactDeleter, DeletionSummary};
pub use pipeline::{CleanupPipeline, CleanupPlan};
pub use report::{ExportPaths, KeptContact, Partition};
pub use rules::{Classification, Rule, RuleChain};
