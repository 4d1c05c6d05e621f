pub mod dedup;
pub mod enrichment;
pub mod orchestrator;
pub mod prune;
