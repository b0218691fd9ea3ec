pub mod gate;
pub mod orchestrator;
pub mod seams;

pub use gate::FixedIntervalGate;
pub use orchestrator::{Orchestrator, PipelineRun};
pub use seams::{DbLedger, DbSink, JsonlSink, Ledger, PostSource, ResultSink};
