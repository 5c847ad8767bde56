pub mod embeddings;
pub mod imagine;
pub mod queue;
pub mod settings;
pub mod stats;
