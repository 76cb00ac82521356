pub mod graph;
pub mod node;

pub use graph::{Topology, TopologyError, TopologyIssue};
pub use node::{DeviceNode, DeviceRecord, DeviceType, UNIT_COUNT_KEY};
