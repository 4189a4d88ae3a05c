use log::info;

use super::layout::{LayoutEngine, LayoutFrame, RefreshMode};
use super::model::TopologyModel;
use super::rpc::{self, ConnectionState, Response, RpcError, TopologyEvent};
use super::types::Point;
use super::wire::Snapshot;
use crate::config::ForceConfig;

/// Per-page state: the topology model, its layout and the socket state.
/// One instance lives for the whole browser session.
pub struct TopologySession {
	model: TopologyModel,
	layout: LayoutEngine,
	connection: ConnectionState,
}

impl TopologySession {
	pub fn new(force: ForceConfig) -> Self {
		Self {
			model: TopologyModel::new(),
			layout: LayoutEngine::new(force),
			connection: ConnectionState::Disconnected,
		}
	}

	pub fn model(&self) -> &TopologyModel {
		&self.model
	}

	pub fn layout(&self) -> &LayoutEngine {
		&self.layout
	}

	pub fn connection(&self) -> ConnectionState {
		self.connection
	}

	pub fn set_connection(&mut self, state: ConnectionState) {
		if self.connection != state {
			info!("topology socket {state:?}");
		}
		self.connection = state;
	}

	/// Loads the startup snapshot: switches first so that links resolve,
	/// then links, then hosts.
	pub fn initialize(&mut self, snapshot: Snapshot) {
		info!(
			"initial topology: {} switches, {} links, {} hosts",
			snapshot.switches.len(),
			snapshot.links.len(),
			snapshot.hosts.len()
		);
		let events = [
			TopologyEvent::SwitchEnter(snapshot.switches),
			TopologyEvent::LinkAdd(snapshot.links),
			TopologyEvent::HostAdd(snapshot.hosts),
		];
		for event in &events {
			event.apply(&mut self.model);
		}
		self.refresh();
	}

	/// Applies one event and restarts the layout.
	pub fn apply(&mut self, event: &TopologyEvent) {
		event.apply(&mut self.model);
		self.refresh();
	}

	pub fn handle_message(&mut self, text: &str) -> Result<Response, RpcError> {
		rpc::dispatch(self, text)
	}

	pub fn refresh(&mut self) {
		self.layout.refresh(&mut self.model, RefreshMode::Full);
	}

	/// Restart that recolors from the primary overlay only.
	pub fn refresh_routes(&mut self) {
		self.layout.refresh(&mut self.model, RefreshMode::RoutesOnly);
	}

	pub fn tick(&mut self, dt: f32) -> LayoutFrame {
		self.layout.tick(&mut self.model, dt)
	}

	pub fn frame(&self) -> LayoutFrame {
		self.layout.frame(&self.model)
	}

	pub fn pin(&mut self, index: usize, pos: Point) {
		self.layout.pin(&mut self.model, index, pos);
	}

	pub fn unpin(&mut self, index: usize) {
		self.layout.unpin(&mut self.model, index);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.layout.resize(width, height);
	}

	/// Index of the placed node closest to `at`, if one lies within `radius`.
	pub fn node_at(&self, at: Point, radius: f64) -> Option<usize> {
		self.model
			.nodes()
			.iter()
			.enumerate()
			.filter_map(|(i, node)| {
				let pos = node.pos?;
				let (dx, dy) = (pos.x - at.x, pos.y - at.y);
				let dist = (dx * dx + dy * dy).sqrt();
				(dist < radius).then_some((i, dist))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::layout::LinkColor;
	use crate::topology::types::{NodeId, OverlaySet};

	fn snapshot() -> Snapshot {
		serde_json::from_str(
			r#"{
				"switches": [
					{"dpid": "0000000000000001", "ports": []},
					{"dpid": "0000000000000002", "ports": []}
				],
				"links": [
					{"src": {"dpid": "0000000000000001", "port_no": "00000001"}, "dst": {"dpid": "0000000000000002", "port_no": "00000001"}},
					{"src": {"dpid": "0000000000000002", "port_no": "00000001"}, "dst": {"dpid": "0000000000000001", "port_no": "00000001"}}
				]
			}"#,
		)
		.unwrap()
	}

	#[test]
	fn initialize_loads_nodes_before_links() {
		let mut session = TopologySession::new(ForceConfig::default());
		session.initialize(snapshot());

		assert_eq!(session.model().nodes().len(), 2);
		assert_eq!(session.model().links().len(), 1);
		assert_eq!(session.model().links()[0].endpoints(), Some((0, 1)));
		assert!(session.layout().is_running());
		assert_eq!(session.frame().links.len(), 1);
	}

	#[test]
	fn refresh_routes_ignores_secondary_overlay() {
		let mut session = TopologySession::new(ForceConfig::default());
		session.initialize(snapshot());
		session.apply(&TopologyEvent::RouteSet {
			set: OverlaySet::Secondary,
			routes: serde_json::from_str(r#"[[{"src_dpid": 2, "dst_dpid": 1}]]"#).unwrap(),
		});
		assert_eq!(session.frame().links[0].color, LinkColor::AlternateRoute);

		session.refresh_routes();
		assert_eq!(session.frame().links[0].color, LinkColor::Default);
	}

	#[test]
	fn node_at_picks_the_nearest_node_in_range() {
		let mut session = TopologySession::new(ForceConfig::default());
		session.initialize(snapshot());
		session.pin(0, Point::new(0.0, 0.0));
		session.pin(1, Point::new(10.0, 0.0));

		assert_eq!(session.node_at(Point::new(2.0, 0.0), 12.0), Some(0));
		assert_eq!(session.node_at(Point::new(8.0, 0.0), 12.0), Some(1));
		assert_eq!(session.node_at(Point::new(50.0, 50.0), 12.0), None);
	}

	#[test]
	fn pin_and_unpin_toggle_fixed() {
		let mut session = TopologySession::new(ForceConfig::default());
		session.initialize(snapshot());
		session.pin(1, Point::new(5.0, 5.0));
		assert!(session.model().nodes()[1].fixed);
		assert_eq!(session.model().index_of(&NodeId::Switch(2)), Some(1));

		session.unpin(1);
		assert!(!session.model().nodes()[1].fixed);
	}

	#[test]
	fn ticking_produces_a_frame_per_step() {
		let mut session = TopologySession::new(ForceConfig::default());
		session.initialize(snapshot());
		let frame = session.tick(0.016);
		assert_eq!(frame.nodes.len(), 2);
		assert_eq!(frame.ports.len(), 2);
	}
}
