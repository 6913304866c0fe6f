pub mod executor;
pub mod fill_model;
pub mod format;
pub mod mapper;
