// Domain layer - Registration data model and rules
pub mod dashboard;
pub mod error;
pub mod graph;
pub mod meta;
pub mod metric;
pub mod registration;
pub mod template;
