// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod compose;
pub mod registry;
pub mod runtime;

pub use compose::ComposeCli;
pub use registry::DockerHubRegistry;
pub use runtime::DockerRuntime;
