pub mod assembler;
pub mod citations;
pub mod corpus;
pub mod extractor;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod recovery;
pub mod repair;
pub mod report;
pub mod run_log;
pub mod runner;
pub mod snapshot;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use extractor::AttributeExtractor;
pub use pipeline::{GeneratedPersona, PersonaGenerator};
pub use runner::{PersonaRunner, RunSummary};
pub use traits::{Acquired, ItemSource, ScrapeStats};
