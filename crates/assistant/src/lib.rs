//! Question answering over the published index generation.
//!
//! A query flows through the classifier, the retrieval gate, the response
//! generator and the sanitizer. Canned replies and the no-data reply skip
//! generation entirely.

pub mod classifier;
pub mod gate;
pub mod generator;
pub mod sanitizer;
pub mod service;

pub use classifier::{classify, Classification};
pub use gate::{GateDecision, RetrievalGate};
pub use generator::{CandidateAnswer, ResponseGenerator};
pub use sanitizer::Sanitizer;
pub use service::{Answer, Assistant};
