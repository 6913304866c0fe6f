pub mod aggregator;
pub mod classifier;
pub mod field_model;
pub mod fillable;
pub mod identity;
pub mod options;
pub mod scanner;
pub mod vocabulary;
pub mod watcher;
