pub mod loader;
pub mod tenants;
pub mod watcher;

pub use loader::{load_alarms, load_dataset, load_scenarios, load_topology, Format};
pub use tenants::TenantRegistry;
pub use watcher::TopologyHandle;
