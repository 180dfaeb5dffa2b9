// src/services/mod.rs

pub mod assessment;
pub mod finalizer;
pub mod sink;

pub use assessment::AssessmentService;
pub use finalizer::Finalizer;
