// Infrastructure layer - External dependencies and adapters
pub mod agent_metrics;
pub mod api_client;
pub mod artifact_store;
pub mod config;
