//! JSON shapes the controller's topology REST and WebSocket APIs use.
//!
//! Everything here is lenient: identifiers may arrive as padded hex strings
//! or plain integers, and entries that do not decode are logged and skipped
//! rather than failing the whole message.

use std::net::Ipv4Addr;

use log::warn;
use serde::Deserialize;

use super::dpid::decode_switch_id;
use super::types::{HostAttachment, NodeId, PortRef};

/// An identifier field: `"000000000000000a"` or `10`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WireId {
	Number(u64),
	Text(String),
}

impl WireId {
	pub fn decode(&self) -> Option<u64> {
		match self {
			WireId::Number(n) => Some(*n),
			WireId::Text(text) => decode_switch_id(text),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct WirePort {
	pub dpid: WireId,
	pub port_no: WireId,
	#[serde(default)]
	pub hw_addr: String,
	#[serde(default)]
	pub name: String,
}

impl WirePort {
	pub fn to_port_ref(&self) -> Option<PortRef> {
		let Some(dpid) = self.dpid.decode() else {
			warn!("skipping port with malformed dpid {:?}", self.dpid);
			return None;
		};
		let Some(port_no) = self.port_no.decode().and_then(|p| u32::try_from(p).ok()) else {
			warn!("skipping port with malformed port_no {:?}", self.port_no);
			return None;
		};
		Some(PortRef::new(NodeId::Switch(dpid), port_no))
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireSwitch {
	pub dpid: WireId,
	#[serde(default)]
	pub ports: Vec<WirePort>,
}

impl WireSwitch {
	pub fn node_id(&self) -> Option<NodeId> {
		let id = self.dpid.decode().map(NodeId::Switch);
		if id.is_none() {
			warn!("skipping switch with malformed dpid {:?}", self.dpid);
		}
		id
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireLink {
	pub src: WirePort,
	pub dst: WirePort,
}

impl WireLink {
	pub fn to_ports(&self) -> Option<(PortRef, PortRef)> {
		Some((self.src.to_port_ref()?, self.dst.to_port_ref()?))
	}
}

/// One hop of a computed route.
#[derive(Clone, Debug, Deserialize)]
pub struct WireRouteHop {
	pub src_dpid: WireId,
	pub dst_dpid: WireId,
}

impl WireRouteHop {
	pub fn to_segment(&self) -> Option<(NodeId, NodeId)> {
		match (self.src_dpid.decode(), self.dst_dpid.decode()) {
			(Some(src), Some(dst)) => Some((NodeId::Switch(src), NodeId::Switch(dst))),
			_ => {
				warn!(
					"skipping route hop with malformed dpid {:?} -> {:?}",
					self.src_dpid, self.dst_dpid
				);
				None
			}
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireHost {
	#[serde(default)]
	pub mac: String,
	#[serde(default)]
	pub ipv4: Vec<String>,
	pub port: WirePort,
}

impl WireHost {
	/// Hosts are keyed by their first parseable IPv4 address.
	pub fn to_attachment(&self) -> Option<HostAttachment> {
		let Some(addr) = self
			.ipv4
			.iter()
			.find_map(|a| a.parse::<Ipv4Addr>().ok())
		else {
			warn!("skipping host {} without an ipv4 address", self.mac);
			return None;
		};
		Some(HostAttachment {
			addr,
			port: self.port.to_port_ref()?,
		})
	}
}

/// The startup snapshot, fetched once before live events are applied.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Snapshot {
	pub switches: Vec<WireSwitch>,
	pub links: Vec<WireLink>,
	#[serde(default)]
	pub hosts: Vec<WireHost>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ryu_link_decodes_to_port_refs() {
		let link: WireLink = serde_json::from_str(
			r#"{
				"src": {"dpid": "0000000000000001", "port_no": "00000002", "hw_addr": "aa:bb:cc:dd:ee:01", "name": "s1-eth2"},
				"dst": {"dpid": "0000000000000002", "port_no": "0000000a", "hw_addr": "aa:bb:cc:dd:ee:02", "name": "s2-eth10"}
			}"#,
		)
		.unwrap();
		let (src, dst) = link.to_ports().unwrap();
		assert_eq!(src, PortRef::new(NodeId::Switch(1), 2));
		assert_eq!(dst, PortRef::new(NodeId::Switch(2), 10));
	}

	#[test]
	fn numeric_and_hex_ids_agree() {
		let hop: WireRouteHop =
			serde_json::from_str(r#"{"src_dpid": 3, "dst_dpid": "0000000000000004"}"#).unwrap();
		assert_eq!(
			hop.to_segment(),
			Some((NodeId::Switch(3), NodeId::Switch(4)))
		);
	}

	#[test]
	fn malformed_entries_are_skipped() {
		let sw: WireSwitch = serde_json::from_str(r#"{"dpid": "not-hex"}"#).unwrap();
		assert_eq!(sw.node_id(), None);

		let host: WireHost = serde_json::from_str(
			r#"{"mac": "00:00:00:00:00:01", "ipv4": [], "port": {"dpid": "1", "port_no": "1"}}"#,
		)
		.unwrap();
		assert_eq!(host.to_attachment(), None);
	}

	#[test]
	fn host_uses_first_valid_ipv4() {
		let host: WireHost = serde_json::from_str(
			r#"{"mac": "m", "ipv4": ["bogus", "10.0.0.7"], "port": {"dpid": "0000000000000002", "port_no": "00000003"}}"#,
		)
		.unwrap();
		let attachment = host.to_attachment().unwrap();
		assert_eq!(attachment.addr, Ipv4Addr::new(10, 0, 0, 7));
		assert_eq!(attachment.port, PortRef::new(NodeId::Switch(2), 3));
	}
}
