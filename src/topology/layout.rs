//! Force-directed layout over the topology model.
//!
//! `force_graph` supplies charge repulsion, springs and anchors. On top of it
//! each step applies a rest-length link constraint and a weak pull towards
//! the canvas centre, both scaled by a cooling `alpha`. The simulation stops
//! stepping once alpha falls below [`ALPHA_MIN`] and is restarted by the
//! next refresh, pin or unpin.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::model::TopologyModel;
use super::types::{Link, NodeId, OverlaySet, Point, Port};
use crate::config::{ColorConfig, ForceConfig};

pub const ALPHA_START: f64 = 0.1;
pub const ALPHA_MIN: f64 = 0.005;
const ALPHA_DECAY: f64 = 0.01;
const LINK_STRENGTH: f64 = 1.0;
const NODE_MASS: f32 = 10.0;

/// Which overlays a refresh recolors links with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshMode {
	#[default]
	Full,
	/// Primary overlay only; the secondary overlay is ignored.
	RoutesOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkColor {
	Default,
	Route,
	AlternateRoute,
}

impl LinkColor {
	pub fn css<'a>(&self, colors: &'a ColorConfig) -> &'a str {
		match self {
			LinkColor::Default => &colors.link,
			LinkColor::Route => &colors.route,
			LinkColor::AlternateRoute => &colors.alternate_route,
		}
	}
}

/// Color for a link given the current overlays. The primary overlay wins.
pub fn link_color(model: &TopologyModel, link: &Link, mode: RefreshMode) -> LinkColor {
	if model.overlay(OverlaySet::Primary).is_empty()
		&& model.overlay(OverlaySet::Secondary).is_empty()
	{
		return LinkColor::Default;
	}
	if model.overlay_contains(OverlaySet::Primary, link) {
		LinkColor::Route
	} else if mode == RefreshMode::Full && model.overlay_contains(OverlaySet::Secondary, link) {
		LinkColor::AlternateRoute
	} else {
		LinkColor::Default
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkLine {
	pub link_idx: usize,
	pub from: Point,
	pub to: Point,
	pub color: LinkColor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeMark {
	pub index: usize,
	pub id: NodeId,
	pub at: Point,
	pub fixed: bool,
	pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortMark {
	pub port: Port,
	pub at: Point,
	pub label: String,
}

/// Everything the renderer needs for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutFrame {
	pub links: Vec<LinkLine>,
	pub nodes: Vec<NodeMark>,
	pub ports: Vec<PortMark>,
}

pub struct LayoutEngine {
	graph: ForceGraph<NodeId, ()>,
	force: ForceConfig,
	/// Node ids in seeding order; a node's slot is its position here.
	ids: Vec<NodeId>,
	slots: HashMap<NodeId, usize>,
	edges: Vec<(usize, usize)>,
	alpha: f64,
	mode: RefreshMode,
}

impl LayoutEngine {
	pub fn new(force: ForceConfig) -> Self {
		Self {
			graph: ForceGraph::new(Self::parameters(&force)),
			force,
			ids: Vec::new(),
			slots: HashMap::new(),
			edges: Vec::new(),
			alpha: 0.0,
			mode: RefreshMode::Full,
		}
	}

	fn parameters(force: &ForceConfig) -> SimulationParameters {
		SimulationParameters {
			force_charge: (-force.charge) as f32,
			force_spring: force.spring as f32,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn mode(&self) -> RefreshMode {
		self.mode
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= ALPHA_MIN
	}

	pub fn center(&self) -> Point {
		Point::new(self.force.width / 2.0, self.force.height / 2.0)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.force.width = width;
		self.force.height = height;
	}

	/// Initial spot for a node that has never been placed: a ring around the
	/// centre, one link length out.
	fn seed_position(&self, i: usize, n: usize) -> Point {
		let angle = (i as f64) * 2.0 * PI / n.max(1) as f64;
		let c = self.center();
		Point::new(
			c.x + self.force.dist * angle.cos(),
			c.y + self.force.dist * angle.sin(),
		)
	}

	/// Rebuilds the simulation from the model and restarts it. Placed nodes
	/// keep their coordinates; new ones are seeded. Links missing an endpoint
	/// stay out until the node shows up.
	pub fn refresh(&mut self, model: &mut TopologyModel, mode: RefreshMode) {
		self.mode = mode;
		self.graph = ForceGraph::new(Self::parameters(&self.force));
		self.ids.clear();
		self.slots.clear();
		self.edges.clear();

		let n = model.nodes().len();
		let mut handles: Vec<DefaultNodeIdx> = Vec::with_capacity(n);
		for i in 0..n {
			let node = &model.nodes()[i];
			let (id, fixed, placed) = (node.id, node.fixed, node.pos);
			let pos = match placed {
				Some(pos) => pos,
				None => {
					let pos = self.seed_position(i, n);
					model.set_position(i, pos);
					pos
				}
			};
			handles.push(self.graph.add_node(NodeData {
				x: pos.x as f32,
				y: pos.y as f32,
				mass: NODE_MASS,
				is_anchor: fixed,
				user_data: id,
			}));
			self.slots.insert(id, i);
			self.ids.push(id);
		}

		for link in model.links() {
			let Some((s, t)) = link.endpoints() else {
				debug!("deferring link {} -> {}: endpoint unknown", link.src.node, link.dst.node);
				continue;
			};
			if s == t || s >= n || t >= n {
				continue;
			}
			self.graph.add_edge(handles[s], handles[t], EdgeData::default());
			self.edges.push((s, t));
		}

		debug!(
			"layout reseeded with {} nodes, {} links ({mode:?})",
			self.ids.len(),
			self.edges.len()
		);
		self.alpha = ALPHA_START;
	}

	pub fn resume(&mut self) {
		self.alpha = self.alpha.max(ALPHA_START);
	}

	/// Advances the simulation by one step and writes coordinates back into
	/// the model. Returns `false` once converged.
	pub fn step(&mut self, model: &mut TopologyModel, dt: f32) -> bool {
		if !self.is_running() {
			return false;
		}
		self.graph.update(dt);

		let mut positions = vec![Point::default(); self.ids.len()];
		let mut anchored = vec![false; self.ids.len()];
		let slots = &self.slots;
		self.graph.visit_nodes(|node| {
			if let Some(&slot) = slots.get(&node.data.user_data) {
				positions[slot] = Point::new(node.x() as f64, node.y() as f64);
				anchored[slot] = node.data.is_anchor;
			}
		});

		self.relax_links(&mut positions, &anchored);
		self.apply_gravity(&mut positions, &anchored);

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(&slot) = slots.get(&node.data.user_data) {
				node.data.x = positions[slot].x as f32;
				node.data.y = positions[slot].y as f32;
			}
		});

		for (slot, id) in self.ids.iter().enumerate() {
			if anchored[slot] {
				continue;
			}
			if let Some(index) = model.index_of(id) {
				model.set_position(index, positions[slot]);
			}
		}

		self.alpha *= 1.0 - ALPHA_DECAY;
		true
	}

	/// Nudges both ends of every link towards the rest length. An anchored
	/// end stays put and the free end takes the whole correction.
	fn relax_links(&self, positions: &mut [Point], anchored: &[bool]) {
		for &(s, t) in &self.edges {
			let (a, b) = (positions[s], positions[t]);
			let (dx, dy) = (b.x - a.x, b.y - a.y);
			let len_sq = dx * dx + dy * dy;
			if len_sq <= 1e-9 {
				continue;
			}
			let len = len_sq.sqrt();
			let k = self.alpha * LINK_STRENGTH * (len - self.force.dist) / len;
			let (dx, dy) = (dx * k, dy * k);
			let (ws, wt) = match (anchored[s], anchored[t]) {
				(true, true) => continue,
				(true, false) => (0.0, 1.0),
				(false, true) => (1.0, 0.0),
				(false, false) => (0.5, 0.5),
			};
			positions[t].x -= dx * wt;
			positions[t].y -= dy * wt;
			positions[s].x += dx * ws;
			positions[s].y += dy * ws;
		}
	}

	fn apply_gravity(&self, positions: &mut [Point], anchored: &[bool]) {
		let k = self.alpha * self.force.gravity;
		if k <= 0.0 {
			return;
		}
		let c = self.center();
		for (pos, &fixed) in positions.iter_mut().zip(anchored) {
			if fixed {
				continue;
			}
			pos.x += (c.x - pos.x) * k;
			pos.y += (c.y - pos.y) * k;
		}
	}

	fn sync_node(&mut self, id: NodeId, pos: Option<Point>, anchor: bool) {
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data != id {
				return;
			}
			if let Some(pos) = pos {
				node.data.x = pos.x as f32;
				node.data.y = pos.y as f32;
			}
			node.data.is_anchor = anchor;
		});
	}

	/// Pins a node at `pos`. The simulation no longer moves it.
	pub fn pin(&mut self, model: &mut TopologyModel, index: usize, pos: Point) {
		let Some(id) = model.nodes().get(index).map(|n| n.id) else {
			return;
		};
		model.set_fixed(index, true);
		model.set_position(index, pos);
		self.sync_node(id, Some(pos), true);
		self.resume();
	}

	/// Releases a pinned node back to the simulation.
	pub fn unpin(&mut self, model: &mut TopologyModel, index: usize) {
		let Some(id) = model.nodes().get(index).map(|n| n.id) else {
			return;
		};
		model.set_fixed(index, false);
		self.sync_node(id, None, false);
		self.resume();
	}

	/// Link lines, node transforms, port positions and link colors for the
	/// model's current coordinates.
	pub fn frame(&self, model: &TopologyModel) -> LayoutFrame {
		let nodes = model.nodes();
		let position = |i: usize| nodes.get(i).and_then(|n| n.pos);

		let links = model
			.links()
			.iter()
			.enumerate()
			.filter_map(|(link_idx, link)| {
				let (s, t) = link.endpoints()?;
				Some(LinkLine {
					link_idx,
					from: position(s)?,
					to: position(t)?,
					color: link_color(model, link, self.mode),
				})
			})
			.collect();

		let node_marks = nodes
			.iter()
			.enumerate()
			.filter_map(|(index, node)| {
				Some(NodeMark {
					index,
					id: node.id,
					at: node.pos?,
					fixed: node.fixed,
					label: node.label(),
				})
			})
			.collect();

		let ports = model
			.ports()
			.into_iter()
			// Hosts draw no port circle of their own.
			.filter(|port| port.port.node.is_switch())
			.filter_map(|port| {
				Some(PortMark {
					at: model.port_position(&port)?,
					label: port.port.label(),
					port,
				})
			})
			.collect();

		LayoutFrame {
			links,
			nodes: node_marks,
			ports,
		}
	}

	pub fn tick(&mut self, model: &mut TopologyModel, dt: f32) -> LayoutFrame {
		self.step(model, dt);
		self.frame(model)
	}
}
