//! Browser plumbing: the controller's topology socket, the startup snapshot
//! and the optional page-embedded config.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, MessageEvent, WebSocket, Window};

use crate::config::ViewConfig;
use crate::topology::{ConnectionState, Snapshot, TopologySession};

pub const SOCKET_PATH: &str = "/v1.0/topology/ws";
pub const SWITCHES_PATH: &str = "/v1.0/topology/switches";
pub const LINKS_PATH: &str = "/v1.0/topology/links";
pub const HOSTS_PATH: &str = "/v1.0/topology/hosts";
pub const CONFIG_ELEMENT_ID: &str = "topology-config";

pub type SharedSession = Rc<RefCell<TopologySession>>;

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("no browser window")]
	NoWindow,

	#[error("javascript error: {0}")]
	Js(String),

	#[error("GET {url} returned {status}")]
	Status { url: String, status: u16 },

	#[error("decoding response: {0}")]
	Decode(#[from] serde_json::Error),
}

impl From<JsValue> for TransportError {
	fn from(value: JsValue) -> Self {
		TransportError::Js(format!("{value:?}"))
	}
}

fn window() -> Result<Window, TransportError> {
	web_sys::window().ok_or(TransportError::NoWindow)
}

pub fn socket_url(host: &str) -> String {
	format!("ws://{host}{SOCKET_PATH}")
}

/// Opens the topology socket for the page's host. Every text message is
/// dispatched into the session and acknowledged on the same socket; rejected
/// messages are logged and get no reply.
pub fn connect(session: SharedSession) -> Result<WebSocket, TransportError> {
	let host = window()?.location().host()?;
	let ws = WebSocket::new(&socket_url(&host))?;

	let session_open = session.clone();
	let on_open = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
		session_open
			.borrow_mut()
			.set_connection(ConnectionState::Connected);
	});
	ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
	on_open.forget();

	let session_close = session.clone();
	let on_close = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
		session_close
			.borrow_mut()
			.set_connection(ConnectionState::Disconnected);
	});
	ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
	on_close.forget();

	let reply = ws.clone();
	let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
		let Some(text) = ev.data().as_string() else {
			warn!("ignoring non-text topology message");
			return;
		};
		let result = session.borrow_mut().handle_message(&text);
		let ack = match result {
			Ok(ack) => ack,
			Err(err) => {
				error!("topology message rejected: {err}");
				return;
			}
		};
		match serde_json::to_string(&ack) {
			Ok(body) => {
				if let Err(err) = reply.send_with_str(&body) {
					error!("sending ack: {err:?}");
				}
			}
			Err(err) => error!("encoding ack: {err}"),
		}
	});
	ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
	on_message.forget();

	Ok(ws)
}

pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, TransportError> {
	let response: web_sys::Response = JsFuture::from(window()?.fetch_with_str(url))
		.await?
		.dyn_into()?;
	if !response.ok() {
		return Err(TransportError::Status {
			url: url.to_owned(),
			status: response.status(),
		});
	}
	let body = JsFuture::from(response.text()?).await?;
	let text = body
		.as_string()
		.ok_or_else(|| TransportError::Js(format!("{url}: body is not text")))?;
	Ok(serde_json::from_str(&text)?)
}

/// Fetches switches, then links, then hosts. Hosts are optional; a missing
/// endpoint just means no host nodes.
pub async fn load_snapshot() -> Result<Snapshot, TransportError> {
	let switches = fetch_json(SWITCHES_PATH).await?;
	let links = fetch_json(LINKS_PATH).await?;
	let hosts = match fetch_json(HOSTS_PATH).await {
		Ok(hosts) => hosts,
		Err(err) => {
			debug!("no host snapshot: {err}");
			Vec::new()
		}
	};
	Ok(Snapshot {
		switches,
		links,
		hosts,
	})
}

/// Reads the JSON override from `<script id="topology-config">`, falling
/// back to defaults when it is absent or invalid.
pub fn load_config() -> ViewConfig {
	let text = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
		.and_then(|el| el.text_content());
	match text {
		None => ViewConfig::default(),
		Some(text) => ViewConfig::from_json(&text).unwrap_or_else(|err| {
			warn!("ignoring invalid topology config: {err}");
			ViewConfig::default()
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn socket_url_targets_topology_endpoint() {
		assert_eq!(socket_url("127.0.0.1:8080"), "ws://127.0.0.1:8080/v1.0/topology/ws");
	}

	#[test]
	fn errors_name_what_failed() {
		let err = TransportError::Status {
			url: LINKS_PATH.into(),
			status: 503,
		};
		assert_eq!(err.to_string(), "GET /v1.0/topology/links returned 503");
	}
}
