pub mod runner;

pub use runner::{Benchmark, EngineRun, RunSettings, RunState};
