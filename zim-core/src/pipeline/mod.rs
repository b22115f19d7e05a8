// zim-core/src/pipeline/mod.rs
pub mod worker;

pub use worker::{spawn_job, JobOutcome, WorkerContext, WorkerJob};
