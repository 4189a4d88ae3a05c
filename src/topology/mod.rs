//! Topology graph synchronization and layout.
//!
//! Controller events flow through [`rpc`] into the [`model::TopologyModel`],
//! and the [`layout::LayoutEngine`] turns the model into a frame per tick.
//! [`session::TopologySession`] ties the pieces together for one page.

pub mod dpid;
pub mod layout;
pub mod model;
pub mod rpc;
pub mod session;
pub mod types;
pub mod wire;

pub use layout::{LayoutFrame, LinkColor, RefreshMode};
pub use model::TopologyModel;
pub use rpc::{ConnectionState, RpcError, TopologyEvent};
pub use session::TopologySession;
pub use types::{Link, Node, NodeId, OverlaySet, Point, Port, PortRef};
pub use wire::Snapshot;
