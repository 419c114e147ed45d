pub mod banner;
pub mod batch;
pub mod cache;
pub mod clients;
pub mod config;
pub mod lease;
pub mod metrics;
pub mod models;
pub mod processing;
pub mod recommendations;
pub mod schema;
pub mod service;
pub mod tenant;

// Convenient re-exports for tests and external callers
pub use banner::*;
pub use batch::*;
pub use cache::*;
pub use clients::*;
pub use config::*;
pub use lease::*;
pub use models::*;
pub use processing::*;
pub use recommendations::*;
pub use service::*;
pub use tenant::*;
