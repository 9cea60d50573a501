// Presentation layer - command line surface
pub mod cli;
