//! JSON-RPC event dispatch from the controller's topology socket.
//!
//! Each inbound `{id, method, params}` envelope decodes into one
//! [`TopologyEvent`], applies one model mutation, triggers a full layout
//! refresh and is answered with an empty result under the same id.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::model::TopologyModel;
use super::session::TopologySession;
use super::types::{Node, NodeId, OverlaySet};
use super::wire::{WireHost, WireLink, WireRouteHop, WireSwitch};

#[derive(Debug, Error)]
pub enum RpcError {
	#[error("unknown method `{0}`")]
	UnknownMethod(String),

	#[error("malformed message: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("message received while disconnected")]
	Disconnected,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
	Connected,
	#[default]
	Disconnected,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Request {
	pub id: Value,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
	pub id: Value,
	pub jsonrpc: &'static str,
	pub result: String,
}

impl Response {
	pub fn ack(id: Value) -> Self {
		Self {
			id,
			jsonrpc: "2.0",
			result: String::new(),
		}
	}
}

#[derive(Clone, Debug)]
pub enum TopologyEvent {
	SwitchEnter(Vec<WireSwitch>),
	SwitchLeave(Vec<WireSwitch>),
	LinkAdd(Vec<WireLink>),
	LinkDelete(Vec<WireLink>),
	/// Route params arrive as a list of hop lists; every list is applied.
	RouteSet {
		set: OverlaySet,
		routes: Vec<Vec<WireRouteHop>>,
	},
	HostAdd(Vec<WireHost>),
}

impl TopologyEvent {
	/// Decodes a method name and its params. The controller's older
	/// `event_*` names are accepted too.
	pub fn decode(method: &str, params: Value) -> Result<Self, RpcError> {
		let event = match method {
			"switch-enter" | "event_switch_enter" => Self::SwitchEnter(serde_json::from_value(params)?),
			"switch-leave" | "event_switch_leave" => Self::SwitchLeave(serde_json::from_value(params)?),
			"link-add" | "event_link_add" => Self::LinkAdd(serde_json::from_value(params)?),
			"link-delete" | "event_link_delete" => Self::LinkDelete(serde_json::from_value(params)?),
			"route-set-primary" | "event_route_set" => Self::RouteSet {
				set: OverlaySet::Primary,
				routes: serde_json::from_value(params)?,
			},
			"route-set-secondary" | "event_route_set_dij" => Self::RouteSet {
				set: OverlaySet::Secondary,
				routes: serde_json::from_value(params)?,
			},
			"host-add" | "event_host_add" => Self::HostAdd(serde_json::from_value(params)?),
			other => return Err(RpcError::UnknownMethod(other.to_owned())),
		};
		Ok(event)
	}

	pub fn method(&self) -> &'static str {
		match self {
			Self::SwitchEnter(_) => "switch-enter",
			Self::SwitchLeave(_) => "switch-leave",
			Self::LinkAdd(_) => "link-add",
			Self::LinkDelete(_) => "link-delete",
			Self::RouteSet {
				set: OverlaySet::Primary,
				..
			} => "route-set-primary",
			Self::RouteSet {
				set: OverlaySet::Secondary,
				..
			} => "route-set-secondary",
			Self::HostAdd(_) => "host-add",
		}
	}

	/// Applies the event as a single model mutation.
	pub fn apply(&self, model: &mut TopologyModel) {
		match self {
			Self::SwitchEnter(switches) => {
				// A switch may already be known from the snapshot or an
				// earlier enter; the model itself does not deduplicate.
				let mut fresh: Vec<NodeId> = Vec::new();
				for id in switches.iter().filter_map(WireSwitch::node_id) {
					if model.index_of(&id).is_some() || fresh.contains(&id) {
						debug!("switch {id} already present");
						continue;
					}
					fresh.push(id);
				}
				model.add_nodes(fresh.into_iter().map(Node::new))
			}
			Self::SwitchLeave(switches) => {
				model.delete_nodes(switches.iter().filter_map(WireSwitch::node_id))
			}
			Self::LinkAdd(links) => model.add_links(links.iter().filter_map(WireLink::to_ports)),
			Self::LinkDelete(links) => {
				model.delete_links(links.iter().filter_map(WireLink::to_ports))
			}
			Self::RouteSet { set, routes } => model.add_route_overlay(
				*set,
				routes.iter().flatten().filter_map(WireRouteHop::to_segment),
			),
			Self::HostAdd(hosts) => model.add_hosts(hosts.iter().filter_map(WireHost::to_attachment)),
		}
	}
}

/// Handles one inbound message end to end and returns the acknowledgment to
/// send back. Nothing is applied when an error is returned.
pub fn dispatch(session: &mut TopologySession, text: &str) -> Result<Response, RpcError> {
	if session.connection() != ConnectionState::Connected {
		return Err(RpcError::Disconnected);
	}
	let request: Request = serde_json::from_str(text)?;
	let event = TopologyEvent::decode(&request.method, request.params)?;
	debug!("rpc {} (id {})", event.method(), request.id);
	session.apply(&event);
	Ok(Response::ack(request.id))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;
	use crate::config::ForceConfig;
	use crate::topology::layout::LinkColor;

	fn connected() -> TopologySession {
		let mut session = TopologySession::new(ForceConfig::default());
		session.set_connection(ConnectionState::Connected);
		session
	}

	fn send(session: &mut TopologySession, id: u64, method: &str, params: Value) -> Response {
		let text = json!({"id": id, "method": method, "params": params}).to_string();
		dispatch(session, &text).unwrap()
	}

	fn switch(dpid: &str) -> Value {
		json!({"dpid": dpid, "ports": []})
	}

	fn link(src: &str, src_port: &str, dst: &str, dst_port: &str) -> Value {
		json!({
			"src": {"dpid": src, "port_no": src_port, "hw_addr": "", "name": ""},
			"dst": {"dpid": dst, "port_no": dst_port, "hw_addr": "", "name": ""},
		})
	}

	const S1: &str = "0000000000000001";
	const S2: &str = "0000000000000002";

	#[test]
	fn ack_echoes_request_id() {
		let mut session = connected();
		let resp = send(&mut session, 7, "switch-enter", json!([switch(S1)]));
		assert_eq!(resp, Response::ack(json!(7)));
		assert_eq!(
			serde_json::to_string(&resp).unwrap(),
			r#"{"id":7,"jsonrpc":"2.0","result":""}"#
		);
	}

	#[test]
	fn unknown_method_is_an_error_and_changes_nothing() {
		let mut session = connected();
		let text = json!({"id": 1, "method": "event_port_modify", "params": []}).to_string();
		let err = dispatch(&mut session, &text).unwrap_err();
		assert!(matches!(err, RpcError::UnknownMethod(ref m) if m == "event_port_modify"));
		assert!(session.model().nodes().is_empty());
	}

	#[test]
	fn malformed_envelope_and_params_are_reported() {
		let mut session = connected();
		assert!(matches!(dispatch(&mut session, "not json"), Err(RpcError::Malformed(_))));
		let text = json!({"id": 1, "method": "link-add", "params": {"src": 1}}).to_string();
		assert!(matches!(dispatch(&mut session, &text), Err(RpcError::Malformed(_))));
	}

	#[test]
	fn disconnected_session_rejects_messages() {
		let mut session = TopologySession::new(ForceConfig::default());
		let text = json!({"id": 1, "method": "switch-enter", "params": []}).to_string();
		assert!(matches!(dispatch(&mut session, &text), Err(RpcError::Disconnected)));
	}

	#[test]
	fn legacy_method_names_are_accepted() {
		for (legacy, current) in [
			("event_switch_enter", "switch-enter"),
			("event_switch_leave", "switch-leave"),
			("event_link_add", "link-add"),
			("event_link_delete", "link-delete"),
			("event_route_set", "route-set-primary"),
			("event_route_set_dij", "route-set-secondary"),
			("event_host_add", "host-add"),
		] {
			let event = TopologyEvent::decode(legacy, json!([])).unwrap();
			assert_eq!(event.method(), current);
		}
	}

	#[test]
	fn every_event_refreshes_the_layout() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1), switch(S2)]));
		assert!(session.model().nodes().iter().all(|n| n.pos.is_some()));
		assert_eq!(session.frame().nodes.len(), 2);

		send(&mut session, 2, "link-add", json!([link(S1, "00000001", S2, "00000001")]));
		assert_eq!(session.frame().links.len(), 1);
	}

	#[test]
	fn topology_walkthrough() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1), switch(S2)]));
		send(&mut session, 2, "link-add", json!([link(S1, "00000001", S2, "00000001")]));
		assert_eq!(session.model().links().len(), 1);
		assert_eq!(session.model().links()[0].src.node, NodeId::Switch(1));

		send(&mut session, 3, "link-add", json!([link(S2, "00000001", S1, "00000001")]));
		assert_eq!(session.model().links().len(), 1);

		send(
			&mut session,
			4,
			"route-set-primary",
			json!([[{"src_dpid": S2, "dst_dpid": S1}]]),
		);
		assert_eq!(session.frame().links[0].color, LinkColor::Route);

		send(&mut session, 5, "switch-leave", json!([switch(S1)]));
		assert_eq!(session.model().nodes().len(), 1);
		assert_eq!(session.model().index_of(&NodeId::Switch(1)), None);
		assert!(session.frame().links.is_empty());
	}

	#[test]
	fn secondary_routes_color_links_differently() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1), switch(S2)]));
		send(&mut session, 2, "link-add", json!([link(S1, "00000001", S2, "00000001")]));
		send(
			&mut session,
			3,
			"route-set-secondary",
			json!([[{"src_dpid": S1, "dst_dpid": S2}]]),
		);
		assert_eq!(session.frame().links[0].color, LinkColor::AlternateRoute);
	}

	#[test]
	fn link_delete_and_host_add_round_out_the_topology() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1), switch(S2)]));
		send(&mut session, 2, "link-add", json!([link(S1, "00000001", S2, "00000002")]));
		send(&mut session, 3, "link-delete", json!([link(S1, "00000001", S2, "00000002")]));
		assert!(session.model().links().is_empty());

		send(
			&mut session,
			4,
			"host-add",
			json!([{"mac": "00:00:00:00:00:01", "ipv4": ["10.0.0.1"], "port": {"dpid": S2, "port_no": "00000003"}}]),
		);
		assert_eq!(session.model().nodes().len(), 3);
		assert_eq!(session.frame().links.len(), 1);
	}

	#[test]
	fn repeated_switch_enter_keeps_one_moving_node() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1)]));
		send(&mut session, 2, "switch-enter", json!([switch(S2)]));
		send(&mut session, 3, "switch-enter", json!([switch(S1), switch("1")]));

		let ids: Vec<NodeId> = session.model().nodes().iter().map(|n| n.id).collect();
		assert_eq!(ids, vec![NodeId::Switch(1), NodeId::Switch(2)]);
		assert_eq!(session.model().index_of(&NodeId::Switch(1)), Some(0));

		let before = session.model().nodes()[0].pos;
		for _ in 0..100 {
			session.tick(0.016);
		}
		assert_ne!(session.model().nodes()[0].pos, before);
		assert_eq!(session.frame().nodes.len(), 2);

		send(&mut session, 4, "switch-leave", json!([switch(S1)]));
		assert_eq!(session.model().index_of(&NodeId::Switch(1)), None);
		assert_eq!(session.model().nodes().len(), 1);
	}

	#[test]
	fn snapshot_after_live_enter_does_not_duplicate() {
		let mut session = connected();
		send(&mut session, 1, "switch-enter", json!([switch(S1)]));
		let snapshot = serde_json::from_value(json!({
			"switches": [switch(S1), switch(S2)],
			"links": [],
		}))
		.unwrap();
		session.initialize(snapshot);
		assert_eq!(session.model().nodes().len(), 2);
		assert_eq!(session.model().node_index().len(), 2);
	}
}
