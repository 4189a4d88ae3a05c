use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ViewState;
use crate::config::ViewConfig;
use crate::topology::LayoutFrame;

const LINK_WIDTH: f64 = 2.0;
const PORT_RADIUS: f64 = 8.0;

pub fn render(frame: &LayoutFrame, view: &ViewState, config: &ViewConfig, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&config.colors.background);
	ctx.fill_rect(0.0, 0.0, view.width, view.height);
	ctx.save();
	let _ = ctx.translate(view.transform.x, view.transform.y);
	let _ = ctx.scale(view.transform.k, view.transform.k);
	draw_links(frame, config, ctx);
	draw_nodes(frame, config, ctx);
	draw_ports(frame, config, ctx);
	ctx.restore();
}

fn draw_links(frame: &LayoutFrame, config: &ViewConfig, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(LINK_WIDTH);
	for line in &frame.links {
		ctx.set_stroke_style_str(line.color.css(&config.colors));
		ctx.begin_path();
		ctx.move_to(line.from.x, line.from.y);
		ctx.line_to(line.to.x, line.to.y);
		ctx.stroke();
	}
}

fn draw_nodes(frame: &LayoutFrame, config: &ViewConfig, ctx: &CanvasRenderingContext2d) {
	let (w, h) = (config.image.width, config.image.height);
	ctx.set_font("12px sans-serif");
	for node in &frame.nodes {
		let (x, y) = (node.at.x, node.at.y);
		let fill = if node.id.is_switch() {
			&config.colors.switch
		} else {
			&config.colors.host
		};
		ctx.set_fill_style_str(fill);
		ctx.fill_rect(x - w / 2.0, y - h / 2.0, w, h);

		// Pinned nodes get an outline.
		if node.fixed {
			ctx.set_stroke_style_str(&config.colors.label);
			ctx.set_line_width(2.0);
			ctx.stroke_rect(x - w / 2.0, y - h / 2.0, w, h);
		}

		ctx.set_fill_style_str(&config.colors.label);
		let _ = ctx.fill_text(&node.label, x - w / 2.0, y + h - 10.0);
	}
}

fn draw_ports(frame: &LayoutFrame, config: &ViewConfig, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("10px sans-serif");
	for port in &frame.ports {
		let (x, y) = (port.at.x, port.at.y);
		ctx.begin_path();
		let _ = ctx.arc(x, y, PORT_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&config.colors.port);
		ctx.fill();

		ctx.set_fill_style_str(&config.colors.label);
		let _ = ctx.fill_text(&port.label, x - 3.0, y + 3.0);
	}
}
