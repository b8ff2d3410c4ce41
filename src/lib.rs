// Shared world state
pub mod world;

// Subscriber fan-out and connection sessions
pub mod subscription;

// HTTP and WebSocket APIs
pub mod api;

// Configuration loading
pub mod config;
