use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::reconcile::{Layer, PAINT_ORDER};
use super::state::ForceGraphState;
use super::style::{DEFAULT_STROKE, EDGE_COLOR, SELECTED_SCALE, SELECTED_STROKE};

const BACKGROUND: &str = "#fafafa";
const LABEL_COLOR: &str = "#333333";
const EDGE_LABEL_COLOR: &str = "#666666";
/// Node labels sit below the circle, this many radii from its center.
const LABEL_OFFSET: f64 = 1.7;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	for layer in PAINT_ORDER {
		match layer {
			Layer::Edges => draw_edges(state, ctx),
			Layer::EdgeLabels if state.show_edge_labels => draw_edge_labels(state, ctx),
			Layer::EdgeLabels => {}
			Layer::Nodes => draw_nodes(state, ctx),
			Layer::NodeLabels => draw_node_labels(state, ctx),
		}
	}
	ctx.restore();
	ctx.set_global_alpha(1.0);
}

fn drawn_radius(radius: f64, selected: bool) -> f64 {
	if selected { radius * SELECTED_SCALE } else { radius }
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let arrow_size = 8.0 / k.max(0.5);
	let dashed = js_sys::Array::of2(&JsValue::from_f64(6.0), &JsValue::from_f64(4.0));
	let solid = js_sys::Array::new();

	for p in state.scene.edges() {
		let edge = &state.store.edges()[p.binding];
		let (s, t) = (state.store.node(edge.source), state.store.node(edge.target));
		let (dx, dy) = (t.x - s.x, t.y - s.y);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			continue;
		}
		let rim = |binding: usize| {
			state
				.scene
				.node_at(binding)
				.map(|n| drawn_radius(n.radius, n.selected))
				.unwrap_or(0.0)
		};
		let (source_r, target_r) = (rim(edge.source), rim(edge.target));
		if dist <= source_r + target_r {
			continue;
		}

		ctx.set_global_alpha(p.opacity);
		ctx.set_stroke_style_str(EDGE_COLOR);
		ctx.set_line_width(p.width);
		// unresolved endpoints are drawn dashed
		let _ = ctx.set_line_dash(if s.placeholder || t.placeholder { &dashed } else { &solid });

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(s.x + ux * source_r, s.y + uy * source_r);
		ctx.line_to(t.x - ux * (target_r + arrow_size), t.y - uy * (target_r + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&solid);
		ctx.set_fill_style_str(EDGE_COLOR);
		let (tip_x, tip_y) = (t.x - ux * target_r, t.y - uy * target_r);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&solid);
	ctx.set_global_alpha(1.0);
}

fn draw_edge_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("10px sans-serif");
	ctx.set_text_align("center");
	ctx.set_fill_style_str(EDGE_LABEL_COLOR);
	for p in state.scene.edges() {
		if p.label.is_empty() {
			continue;
		}
		let edge = &state.store.edges()[p.binding];
		let (s, t) = (state.store.node(edge.source), state.store.node(edge.target));
		ctx.set_global_alpha(p.label_opacity);
		let _ = ctx.fill_text(&p.label, (s.x + t.x) / 2.0, (s.y + t.y) / 2.0 - 4.0);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	for p in state.scene.nodes() {
		let node = state.store.node(p.binding);
		let radius = drawn_radius(p.radius, p.selected);
		ctx.set_global_alpha(p.opacity);
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(p.fill);
		ctx.fill();

		let hovered = state.hover == Some(p.binding);
		let (stroke, width) = match (p.selected, hovered) {
			(true, _) => (SELECTED_STROKE, 3.0),
			(false, true) => (DEFAULT_STROKE, 3.0),
			(false, false) => (DEFAULT_STROKE, 1.5),
		};
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(width);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_node_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_fill_style_str(LABEL_COLOR);
	for p in state.scene.nodes() {
		let node = state.store.node(p.binding);
		ctx.set_global_alpha(p.opacity);
		let _ = ctx.fill_text(&p.label, node.x, node.y + p.radius * LABEL_OFFSET);
	}
	ctx.set_global_alpha(1.0);
}
