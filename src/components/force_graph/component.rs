use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::interaction::{DoubleClickAction, Highlight};
use super::render;
use super::state::{FocusPin, ForceGraphState, PointerOutcome};
use super::style::StyleTable;
use super::types::{GraphCommand, GraphData, GraphNode, NodeId};
use crate::config::GraphConfig;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type SharedClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

const DEFAULT_HEIGHT: f64 = 600.0;

/// Canvas size from the parent element, or the defaults when detached.
fn measure(canvas: &HtmlCanvasElement, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	let w = parent
		.as_ref()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0);
	let h = height.unwrap_or_else(|| {
		parent
			.as_ref()
			.map(|p| p.client_height() as f64)
			.filter(|h| *h > 0.0)
			.unwrap_or(DEFAULT_HEIGHT)
	});
	(w, h)
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Releases `pin` after `ms`, provided the view it belongs to is still loaded.
fn schedule_focus_release(state: &SharedState, pin: FocusPin, ms: u32) {
	let state = state.clone();
	Timeout::new(ms, move || {
		if let Some(ref mut s) = *state.borrow_mut() {
			s.release_focus(&pin);
		}
	})
	.forget();
}

/// Detaches the resize listener, cancels the pending frame and drops the
/// closures, which breaks the animate closure's reference to itself.
fn teardown(state: &SharedState, animate: &SharedClosure, resize_cb: &SharedClosure, frame: &Cell<Option<i32>>) {
	let window = web_sys::window();
	if let (Some(cb), Some(window)) = (resize_cb.borrow_mut().take(), window.as_ref()) {
		let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}
	if let (Some(id), Some(window)) = (frame.take(), window.as_ref()) {
		let _ = window.cancel_animation_frame(id);
	}
	animate.borrow_mut().take();
	state.borrow_mut().take();
}

/// Loads `data` and reports a dropped selection to the page.
fn load_into(state: &SharedState, data: &GraphData, on_select: Callback<Option<GraphNode>>) {
	let (outcome, pin_ms) = {
		let mut guard = state.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		(s.load(data), s.layout.config().focus_pin_ms)
	};
	if let Some(pin) = outcome.focus {
		schedule_focus_release(state, pin, pin_ms);
	}
	if outcome.selection_lost {
		on_select.run(None);
	}
}

/// Force-directed graph on a canvas.
///
/// The canvas owns layout and selection; the page drives it through `data`,
/// `highlight`, `show_edge_labels` and `command`, and hears back through
/// `on_select` and `on_expand`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] highlight: Signal<Highlight>,
	#[prop(into)] show_edge_labels: Signal<bool>,
	#[prop(into)] command: Signal<Option<GraphCommand>>,
	#[prop(into)] on_select: Callback<Option<GraphNode>>,
	#[prop(optional)] on_expand: Option<Callback<NodeId>>,
	#[prop(default = GraphConfig::explorer())] config: GraphConfig,
	#[prop(default = StyleTable::EXPLORER)] styles: StyleTable,
	/// Clicking empty canvas clears the selection.
	#[prop(default = false)]
	clear_on_background: bool,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: SharedClosure = Rc::new(RefCell::new(None));
	let resize_cb: SharedClosure = Rc::new(RefCell::new(None));
	let frame = Rc::new(Cell::new(None::<i32>));
	let alive = Arc::new(AtomicBool::new(true));
	let (state_init, animate_init, resize_cb_init, alive_init, frame_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), alive.clone(), frame.clone());

	let loop_handles = StoredValue::new_local((state.clone(), animate.clone(), resize_cb.clone(), frame));
	on_cleanup({
		let alive = alive.clone();
		move || {
			alive.store(false, Ordering::Relaxed);
			loop_handles.try_with_value(|(state, animate, resize_cb, frame)| {
				teardown(state, animate, resize_cb, frame);
			});
		}
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas;
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = measure(&canvas, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d =
			match canvas.get_context("2d").ok().flatten().and_then(|c| c.dyn_into().ok()) {
				Some(ctx) => ctx,
				None => {
					error!("canvas 2d context unavailable");
					return;
				}
			};
		let mut initial = ForceGraphState::new(config.clone(), styles, w, h);
		initial.set_highlight(highlight.get_untracked());
		initial.show_edge_labels = show_edge_labels.get_untracked();
		*state_init.borrow_mut() = Some(initial);
		load_into(&state_init, &data.get_untracked(), on_select);

		let (state_resize, canvas_resize, alive_resize) =
			(state_init.clone(), canvas.clone(), alive_init.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_resize.load(Ordering::Relaxed) {
				return;
			}
			let (nw, nh) = measure(&canvas_resize, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, alive_anim, frame_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone(), frame_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			frame_anim.set(None);
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				frame_anim.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let state_data = state.clone();
	Effect::new(move |prev: Option<()>| {
		let d = data.get();
		// the first load happens during canvas setup
		if prev.is_some() {
			load_into(&state_data, &d, on_select);
		}
	});

	let state_hl = state.clone();
	Effect::new(move |_| {
		let hl = highlight.get();
		if let Some(ref mut s) = *state_hl.borrow_mut() {
			s.set_highlight(hl);
		}
	});

	let state_labels = state.clone();
	Effect::new(move |_| {
		let visible = show_edge_labels.get();
		if let Some(ref mut s) = *state_labels.borrow_mut() {
			s.show_edge_labels = visible;
		}
	});

	let state_cmd = state.clone();
	Effect::new(move |_| {
		let Some(cmd) = command.get() else {
			return;
		};
		let cleared = match *state_cmd.borrow_mut() {
			Some(ref mut s) => s.command(&cmd),
			None => false,
		};
		if cleared {
			on_select.run(None);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let over_node = match *state_mm.borrow_mut() {
			Some(ref mut s) => {
				s.pointer_move(x, y);
				s.hover.is_some() || s.drag.active
			}
			None => false,
		};
		if let Some(canvas) = canvas_ref.get() {
			let cursor = if over_node { "pointer" } else { "grab" };
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let outcome = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				let outcome = s.pointer_up();
				match outcome {
					PointerOutcome::BackgroundClick if clear_on_background && s.clear_selection() => {
						PointerOutcome::NodeClick(None)
					}
					other => other,
				}
			}
			None => PointerOutcome::None,
		};
		if let PointerOutcome::NodeClick(selected) = outcome {
			on_select.run(selected);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_dbl = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let action = match *state_dbl.borrow() {
			Some(ref s) => s.double_click(x, y),
			None => None,
		};
		match action {
			Some(DoubleClickAction::OpenLink(url)) => {
				let opened = web_sys::window().map(|w| w.open_with_url_and_target(&url, "_blank"));
				if !matches!(opened, Some(Ok(_))) {
					warn!("could not open {url}");
				}
			}
			Some(DoubleClickAction::Expand(id)) => {
				if let Some(cb) = on_expand {
					cb.run(id);
				}
			}
			None => {}
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(ev.delta_y(), x, y);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
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
