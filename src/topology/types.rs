use std::fmt;
use std::net::Ipv4Addr;

use super::dpid::{encode_switch_id, format_switch_id};

/// Identity of a topology node.
///
/// The derived ordering puts every switch before every host, switches by
/// numeric datapath id and hosts by address. Canonical link orientation is
/// decided on this ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
	Switch(u64),
	Host(Ipv4Addr),
}

impl NodeId {
	pub fn is_switch(&self) -> bool {
		matches!(self, NodeId::Switch(_))
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeId::Switch(dpid) => f.write_str(&encode_switch_id(*dpid)),
			NodeId::Host(addr) => write!(f, "{addr}"),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// `self * weight + other * (1 - weight)`
	pub fn lerp(self, other: Point, weight: f64) -> Point {
		Point {
			x: self.x * weight + other.x * (1.0 - weight),
			y: self.y * weight + other.y * (1.0 - weight),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	/// Pinned by the user; the simulation leaves it where it is.
	pub fixed: bool,
	/// Unset until the layout engine places the node.
	pub pos: Option<Point>,
}

impl Node {
	pub fn new(id: NodeId) -> Self {
		Self {
			id,
			fixed: false,
			pos: None,
		}
	}

	pub fn label(&self) -> String {
		match self.id {
			NodeId::Switch(dpid) => format!("dpid: {dpid}"),
			NodeId::Host(addr) => format!("ipv4: {addr}"),
		}
	}
}

/// One end of a link: a numbered port on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
	pub node: NodeId,
	pub port_no: u32,
}

impl PortRef {
	pub fn new(node: NodeId, port_no: u32) -> Self {
		Self { node, port_no }
	}

	/// Port number as the controller pads it, with the padding stripped.
	pub fn label(&self) -> String {
		format_switch_id(&format!("{:08x}", self.port_no)).to_owned()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	pub src: PortRef,
	pub dst: PortRef,
	/// Position of `src.node` in the node collection, if known.
	pub source: Option<usize>,
	/// Position of `dst.node` in the node collection, if known.
	pub target: Option<usize>,
}

impl Link {
	pub fn endpoints(&self) -> Option<(usize, usize)> {
		Some((self.source?, self.target?))
	}

	/// Undirected comparison against a route segment's endpoints.
	pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
		(self.src.node == a && self.dst.node == b) || (self.src.node == b && self.dst.node == a)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkEnd {
	Source,
	Target,
}

impl LinkEnd {
	/// Interpolation weight towards the link's source node.
	pub fn weight(self) -> f64 {
		match self {
			LinkEnd::Source => PORT_BIAS,
			LinkEnd::Target => 1.0 - PORT_BIAS,
		}
	}
}

/// How far along a link a port marker sits from the far end.
pub const PORT_BIAS: f64 = 0.88;

/// A port derived from the link set, tagged with the link that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Port {
	pub port: PortRef,
	pub link_idx: usize,
	pub end: LinkEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlaySet {
	/// Routes from the main routing algorithm.
	Primary,
	/// Routes from the alternate algorithm.
	Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteSegment {
	pub src: NodeId,
	pub dst: NodeId,
	pub source: Option<usize>,
	pub target: Option<usize>,
}

/// A host seen behind a switch port.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostAttachment {
	pub addr: Ipv4Addr,
	pub port: PortRef,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn switches_order_before_hosts() {
		let host = NodeId::Host(Ipv4Addr::new(10, 0, 0, 1));
		assert!(NodeId::Switch(u64::MAX) < host);
		assert!(NodeId::Switch(1) < NodeId::Switch(2));
		assert!(host < NodeId::Host(Ipv4Addr::new(10, 0, 0, 2)));
	}

	#[test]
	fn labels_use_decimal_dpid_and_trimmed_port() {
		assert_eq!(Node::new(NodeId::Switch(0x1f)).label(), "dpid: 31");
		assert_eq!(
			Node::new(NodeId::Host(Ipv4Addr::new(10, 0, 0, 3))).label(),
			"ipv4: 10.0.0.3"
		);
		assert_eq!(PortRef::new(NodeId::Switch(1), 2).label(), "2");
		assert_eq!(PortRef::new(NodeId::Switch(1), 0x10).label(), "10");
	}

	#[test]
	fn port_weights_mirror_each_other() {
		assert_eq!(LinkEnd::Source.weight(), 0.88);
		assert!((LinkEnd::Target.weight() - 0.12).abs() < 1e-12);
	}
}
