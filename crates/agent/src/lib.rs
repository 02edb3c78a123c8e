// Domain-driven module structure for the elftail agent.

// Core infrastructure
pub mod client;
pub mod conf;

// Domain modules
pub mod elf;
pub mod runtime;
