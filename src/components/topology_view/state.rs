use log::debug;

use crate::topology::{NodeId, Point, TopologySession};

/// Zoom limits for the wheel.
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Pointer and camera state for the canvas. The topology itself lives in
/// the session; this only tracks how it is being looked at and dragged.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
}

impl ViewState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			..Default::default()
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn begin_drag(&mut self, node: NodeId, sx: f64, sy: f64, node_start: Point) {
		self.drag = DragState {
			active: true,
			node: Some(node),
			start_x: sx,
			start_y: sy,
			node_start,
		};
	}

	/// Graph position the dragged node should move to for the pointer at
	/// `(sx, sy)`.
	pub fn drag_target(&self, sx: f64, sy: f64) -> Option<(NodeId, Point)> {
		if !self.drag.active {
			return None;
		}
		let node = self.drag.node?;
		let (dx, dy) = (
			(sx - self.drag.start_x) / self.transform.k,
			(sy - self.drag.start_y) / self.transform.k,
		);
		Some((
			node,
			Point::new(self.drag.node_start.x + dx, self.drag.node_start.y + dy),
		))
	}

	/// Pins the dragged node under the pointer. Events can reorder or remove
	/// nodes mid-drag, so the node is looked up by id on every move; a drag
	/// whose node has gone is dropped. Returns whether a drag is in progress.
	pub fn drag_to(&mut self, session: &mut TopologySession, sx: f64, sy: f64) -> bool {
		let Some((node, pos)) = self.drag_target(sx, sy) else {
			return false;
		};
		match session.model().index_of(&node) {
			Some(idx) => session.pin(idx, pos),
			None => {
				debug!("dragged node {node} left the topology");
				self.drag = DragState::default();
			}
		}
		true
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Ends any drag or pan. A dragged node stays pinned.
	pub fn release(&mut self) {
		self.drag = DragState::default();
		self.pan.active = false;
	}

	/// Zooms about the pointer so the point under it stays put.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
