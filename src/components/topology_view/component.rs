use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WebSocket, WheelEvent, Window};

use super::render;
use super::state::ViewState;
use crate::config::ViewConfig;
use crate::topology::TopologySession;
use crate::transport::{self, SharedSession};

const TICK_SECONDS: f32 = 0.016;

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Live canvas of the controller's topology. Loads the snapshot, subscribes
/// to the topology socket and redraws on every animation frame.
#[component]
pub fn TopologyView(
	#[prop(optional)] config: ViewConfig,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = Rc::new(config);
	let session: SharedSession = Rc::new(RefCell::new(TopologySession::new(config.force.clone())));
	let view_state = Rc::new(RefCell::new(ViewState::new(config.force.width, config.force.height)));
	let socket: Rc<RefCell<Option<WebSocket>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (session_init, view_init, config_init) = (session.clone(), view_state.clone(), config.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("topology view needs a browser window");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((config_init.force.width, config_init.force.height))
		} else {
			(config_init.force.width, config_init.force.height)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		view_init.borrow_mut().resize(w, h);
		session_init.borrow_mut().resize(w, h);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					error!("2d context has an unexpected type");
					return;
				}
			},
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};

		let session_load = session_init.clone();
		wasm_bindgen_futures::spawn_local(async move {
			match transport::load_snapshot().await {
				Ok(snapshot) => session_load.borrow_mut().initialize(snapshot),
				Err(err) => error!("loading topology snapshot: {err}"),
			}
		});

		match transport::connect(session_init.clone()) {
			Ok(ws) => *socket.borrow_mut() = Some(ws),
			Err(err) => error!("connecting topology socket: {err}"),
		}

		if fullscreen {
			let (session_resize, view_resize, canvas_resize) =
				(session_init.clone(), view_init.clone(), canvas.clone());
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				view_resize.borrow_mut().resize(nw, nh);
				session_resize.borrow_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (session_anim, view_anim, config_anim, animate_inner) = (
			session_init.clone(),
			view_init.clone(),
			config_init.clone(),
			animate.clone(),
		);
		*animate.borrow_mut() = Some(Closure::new(move || {
			let frame = session_anim.borrow_mut().tick(TICK_SECONDS);
			render::render(&frame, &view_anim.borrow(), &config_anim, &ctx);
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let hit_radius = config.image.width / 2.0;

	let (session_md, view_md) = (session.clone(), view_state.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut view = view_md.borrow_mut();
		let at = view.screen_to_graph(x, y);
		let mut session = session_md.borrow_mut();
		let hit = session.node_at(at, hit_radius).and_then(|idx| {
			let node = &session.model().nodes()[idx];
			Some((idx, node.id, node.pos?))
		});
		match hit {
			Some((idx, id, pos)) => {
				view.begin_drag(id, x, y, pos);
				session.pin(idx, pos);
			}
			None => view.begin_pan(x, y),
		}
	};

	let (session_mm, view_mm) = (session.clone(), view_state.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut view = view_mm.borrow_mut();
		if !view.drag_to(&mut session_mm.borrow_mut(), x, y) {
			view.pan_to(x, y);
		}
	};

	let view_mu = view_state.clone();
	let on_mouseup = move |_: MouseEvent| view_mu.borrow_mut().release();

	let view_ml = view_state.clone();
	let on_mouseleave = move |_: MouseEvent| view_ml.borrow_mut().release();

	let (session_dc, view_dc) = (session.clone(), view_state.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let at = view_dc.borrow().screen_to_graph(x, y);
		let mut session = session_dc.borrow_mut();
		if let Some(idx) = session.node_at(at, hit_radius) {
			session.unpin(idx);
		}
	};

	let view_wh = view_state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		view_wh.borrow_mut().zoom_at(x, y, ev.delta_y());
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="topology-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
