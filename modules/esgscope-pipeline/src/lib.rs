pub mod extract;
pub mod filter;
pub mod orchestrator;
pub mod prompt;
pub mod segmenter;
pub mod selector;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod weighter;
