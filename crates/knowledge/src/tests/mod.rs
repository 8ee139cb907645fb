//! Crate-level tests for retrieval ranking and the answer pipeline.
