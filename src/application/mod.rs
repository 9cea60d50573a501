// Application layer - Registration use cases
pub mod binder;
pub mod catalog;
pub mod checks;
pub mod interpolation;
pub mod metric_source;
pub mod pipeline;
pub mod platform_api;
pub mod synchronizer;
