pub mod builder;
pub mod engine;
pub mod options;
pub mod snapshot;

pub use builder::GaBuilder;
pub use engine::{EngineState, Ga, GaResult, StopReason};
pub use options::{EvolutionOptions, EvolutionOptionsBuilder};
pub use snapshot::{GenerationReport, Snapshot};
