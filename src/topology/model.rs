use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{
	HostAttachment, Link, LinkEnd, Node, NodeId, OverlaySet, Point, Port, PortRef, RouteSegment,
};

/// Port number recorded on the host side of a host attachment link.
pub const HOST_PORT_NO: u32 = 0;

/// The live topology: nodes, links, both route overlays and the node index.
///
/// Every position stored in a link or segment is resolved through the node
/// index, which is rebuilt from scratch after any node mutation.
#[derive(Debug, Default)]
pub struct TopologyModel {
	nodes: Vec<Node>,
	links: Vec<Link>,
	primary: Vec<RouteSegment>,
	secondary: Vec<RouteSegment>,
	node_index: HashMap<NodeId, usize>,
}

fn is_canonical(src: &PortRef, dst: &PortRef) -> bool {
	src.node < dst.node
}

impl TopologyModel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn node_index(&self) -> &HashMap<NodeId, usize> {
		&self.node_index
	}

	pub fn index_of(&self, id: &NodeId) -> Option<usize> {
		self.node_index.get(id).copied()
	}

	pub fn overlay(&self, set: OverlaySet) -> &[RouteSegment] {
		match set {
			OverlaySet::Primary => &self.primary,
			OverlaySet::Secondary => &self.secondary,
		}
	}

	fn overlay_mut(&mut self, set: OverlaySet) -> &mut Vec<RouteSegment> {
		match set {
			OverlaySet::Primary => &mut self.primary,
			OverlaySet::Secondary => &mut self.secondary,
		}
	}

	pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) {
		for node in nodes {
			debug!("add node {}", node.id);
			self.nodes.push(node);
		}
		self.reindex();
	}

	pub fn delete_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
		for id in ids {
			match self.nodes.iter().position(|n| n.id == id) {
				Some(pos) => {
					debug!("delete node {id}");
					self.nodes.remove(pos);
				}
				None => debug!("delete node {id}: not present"),
			}
		}
		self.reindex();
	}

	/// Adds links in canonical orientation only. A link whose node pair is
	/// already joined is dropped, so the graph stays simple.
	pub fn add_links(&mut self, links: impl IntoIterator<Item = (PortRef, PortRef)>) {
		for (src, dst) in links {
			if !is_canonical(&src, &dst) {
				continue;
			}
			if self.links.iter().any(|l| l.joins(src.node, dst.node)) {
				debug!("link {} -> {} already present", src.node, dst.node);
				continue;
			}
			debug!(
				"add link {}:{} -> {}:{}",
				src.node, src.port_no, dst.node, dst.port_no
			);
			let (source, target) = (self.index_of(&src.node), self.index_of(&dst.node));
			self.links.push(Link {
				src,
				dst,
				source,
				target,
			});
		}
	}

	pub fn delete_links(&mut self, links: impl IntoIterator<Item = (PortRef, PortRef)>) {
		for (src, dst) in links {
			if !is_canonical(&src, &dst) {
				continue;
			}
			if let Some(pos) = self.links.iter().position(|l| l.src == src && l.dst == dst) {
				debug!("delete link {} -> {}", src.node, dst.node);
				self.links.remove(pos);
			}
		}
	}

	/// Adds each host as a node plus its attachment link. Hosts already
	/// present are left alone.
	pub fn add_hosts(&mut self, hosts: impl IntoIterator<Item = HostAttachment>) {
		let mut attachments = Vec::new();
		let mut seen = HashSet::new();
		for host in hosts {
			let id = NodeId::Host(host.addr);
			if self.node_index.contains_key(&id) || !seen.insert(id) {
				continue;
			}
			debug!("add host {} behind {}:{}", host.addr, host.port.node, host.port.port_no);
			self.nodes.push(Node::new(id));
			attachments.push((host.port, PortRef::new(id, HOST_PORT_NO)));
		}
		self.reindex();
		self.add_links(attachments);
	}

	/// Appends to an overlay. Earlier segments stay until the overlay is
	/// cleared explicitly.
	pub fn add_route_overlay(
		&mut self,
		set: OverlaySet,
		segments: impl IntoIterator<Item = (NodeId, NodeId)>,
	) {
		let resolved: Vec<RouteSegment> = segments
			.into_iter()
			.map(|(src, dst)| RouteSegment {
				src,
				dst,
				source: self.index_of(&src),
				target: self.index_of(&dst),
			})
			.collect();
		debug!("add {} segments to {set:?} overlay", resolved.len());
		self.overlay_mut(set).extend(resolved);
	}

	pub fn clear_route_overlay(&mut self, set: OverlaySet) {
		self.overlay_mut(set).clear();
	}

	/// Whether any segment of the overlay joins the link's nodes, in either
	/// direction.
	pub fn overlay_contains(&self, set: OverlaySet, link: &Link) -> bool {
		self.overlay(set).iter().any(|seg| link.joins(seg.src, seg.dst))
	}

	/// Ports derived from the current link set, first occurrence wins.
	pub fn ports(&self) -> Vec<Port> {
		let mut pushed = HashSet::new();
		let mut ports = Vec::new();
		for (link_idx, link) in self.links.iter().enumerate() {
			for (port, end) in [(link.src, LinkEnd::Source), (link.dst, LinkEnd::Target)] {
				if pushed.insert(port) {
					ports.push(Port {
						port,
						link_idx,
						end,
					});
				}
			}
		}
		ports
	}

	/// Where to draw a port marker: on its link, near its own node. `None`
	/// until both of the link's nodes have been placed.
	pub fn port_position(&self, port: &Port) -> Option<Point> {
		let link = self.links.get(port.link_idx)?;
		let (source, target) = link.endpoints()?;
		let from = self.nodes.get(source)?.pos?;
		let to = self.nodes.get(target)?.pos?;
		Some(from.lerp(to, port.end.weight()))
	}

	pub fn set_position(&mut self, index: usize, pos: Point) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.pos = Some(pos);
		}
	}

	pub fn set_fixed(&mut self, index: usize, fixed: bool) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fixed = fixed;
		}
	}

	/// Rebuilds the node index and re-resolves every link and segment
	/// against it.
	pub fn reindex(&mut self) {
		self.node_index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id, i))
			.collect();

		let index = &self.node_index;
		for link in &mut self.links {
			link.source = index.get(&link.src.node).copied();
			link.target = index.get(&link.dst.node).copied();
		}
		for seg in self.primary.iter_mut().chain(self.secondary.iter_mut()) {
			seg.source = index.get(&seg.src).copied();
			seg.target = index.get(&seg.dst).copied();
		}
	}
}
