use leptos::prelude::*;

use crate::components::topology_view::TopologyView;
use crate::transport::load_config;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = load_config();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TopologyView config=config fullscreen=true />
				<div class="graph-overlay">
					<h1>"SDN Topology"</h1>
					<p class="subtitle">
						"Drag a switch to pin it, double-click to release. Scroll to zoom. Drag background to pan."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
