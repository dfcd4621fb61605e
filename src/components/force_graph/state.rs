use std::collections::HashMap;

use log::{debug, info};

use crate::config::GraphConfig;

use super::interaction::{
	DoubleClickAction, DragState, Highlight, PanState, Selection, SelectionChange, ViewTransform,
	beyond_slop, double_click_action,
};
use super::reconcile::{ReconcileReport, Scene};
use super::simulation::ForceLayout;
use super::store::GraphStore;
use super::style::{SELECTED_SCALE, StyleTable};
use super::types::{GraphCommand, GraphData, GraphNode, NodeId};

/// Wheel step per notch.
const WHEEL_ZOOM_IN: f64 = 1.1;
const WHEEL_ZOOM_OUT: f64 = 0.9;

/// A node pinned at the center after a load, released later if the view is unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusPin {
	pub generation: u64,
	pub id: NodeId,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadOutcome {
	pub report: ReconcileReport,
	/// The selected node disappeared with this load.
	pub selection_lost: bool,
	pub focus: Option<FocusPin>,
}

/// What a completed press/release gesture amounted to.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerOutcome {
	None,
	/// A node was clicked; carries the new selection (`None` after a toggle-off).
	NodeClick(Option<GraphNode>),
	BackgroundClick,
}

pub struct ForceGraphState {
	pub store: GraphStore,
	pub layout: ForceLayout,
	pub scene: Scene,
	styles: StyleTable,
	pub selection: Selection,
	highlight: Highlight,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<usize>,
	pub width: f64,
	pub height: f64,
	pub show_edge_labels: bool,
}

impl ForceGraphState {
	pub fn new(config: GraphConfig, styles: StyleTable, width: f64, height: f64) -> Self {
		Self {
			store: GraphStore::new(),
			layout: ForceLayout::new(config, width, height),
			scene: Scene::new(),
			styles,
			selection: Selection::default(),
			highlight: Highlight::default(),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			width,
			height,
			show_edge_labels: true,
		}
	}

	pub fn styles(&self) -> &StyleTable {
		&self.styles
	}

	fn config(&self) -> &GraphConfig {
		self.layout.config()
	}

	/// Replaces the view with `data`. Nodes that survive keep their position,
	/// primitive and selection; new ones are seeded around the center.
	pub fn load(&mut self, data: &GraphData) -> LoadOutcome {
		let previous: HashMap<NodeId, (f64, f64)> = self
			.store
			.nodes()
			.iter()
			.filter(|n| !n.placeholder)
			.map(|n| (n.id.clone(), (n.x, n.y)))
			.collect();

		self.store.replace(&data.nodes, &data.links);
		for node in self.store.nodes_mut() {
			if node.placeholder {
				continue;
			}
			if let Some(&(x, y)) = previous.get(&node.id) {
				node.x = x;
				node.y = y;
				node.positioned = true;
			}
		}
		self.drag = DragState::default();
		self.hover = None;
		self.layout.seed(&mut self.store);

		let report = self.scene.reconcile(&self.store, &self.styles);
		info!(
			"graph loaded: {} nodes, {} edges (+{} -{} ={} nodes)",
			self.store.node_count(),
			self.store.edge_count(),
			report.nodes.added,
			report.nodes.removed,
			report.nodes.kept
		);

		let selection_lost = match self.selection.selected() {
			Some(id) if self.store.lookup(id).is_none() => {
				self.selection.clear();
				true
			}
			_ => false,
		};
		self.scene.apply_highlight(&self.store, &self.highlight);

		let focus = data.focus.as_ref().and_then(|id| {
			let idx = self.store.index_of(id)?;
			let (cx, cy) = self.layout.center();
			self.layout.pin(&mut self.store, idx, cx, cy);
			Some(FocusPin {
				generation: self.store.generation(),
				id: id.clone(),
			})
		});

		LoadOutcome {
			report,
			selection_lost,
			focus,
		}
	}

	/// Releases a focus pin unless another view was loaded meanwhile.
	pub fn release_focus(&mut self, pin: &FocusPin) -> bool {
		if self.store.generation() != pin.generation {
			debug!("focus pin for {} outlived its view", pin.id);
			return false;
		}
		let Some(idx) = self.store.index_of(&pin.id) else {
			return false;
		};
		if self.drag.node_idx == Some(idx) {
			return false;
		}
		self.layout.unpin(&mut self.store, idx);
		true
	}

	pub fn set_highlight(&mut self, highlight: Highlight) {
		if self.highlight == highlight {
			return;
		}
		self.highlight = highlight;
		self.scene.apply_highlight(&self.store, &self.highlight);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.screen_to_graph(sx, sy)
	}

	/// Topmost node under a screen point, using the drawn radius.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.scene.nodes().iter().rev().find_map(|p| {
			let node = self.store.node(p.binding);
			let r = if p.selected { p.radius * SELECTED_SCALE } else { p.radius };
			((node.x - gx).hypot(node.y - gy) <= r).then_some(p.binding)
		})
	}

	pub fn selected_node(&self) -> Option<GraphNode> {
		let id = self.selection.selected()?;
		self.store.lookup(id).map(|n| n.to_graph_node())
	}

	fn apply_change(&mut self, change: &SelectionChange) {
		if let Some(id) = &change.restore {
			self.scene.set_selected(id, false);
		}
		if let Some(id) = &change.select {
			self.scene.set_selected(id, true);
		}
	}

	pub fn click_node(&mut self, idx: usize) -> Option<GraphNode> {
		let id = self.store.node(idx).id.clone();
		let change = self.selection.click(&id);
		self.apply_change(&change);
		self.selected_node()
	}

	/// Returns whether anything was selected.
	pub fn clear_selection(&mut self) -> bool {
		let change = self.selection.clear();
		self.apply_change(&change);
		change.restore.is_some()
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				moved: false,
			};
		} else {
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
				moved: false,
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			if !self.drag.moved {
				if !beyond_slop(self.drag.start_x, self.drag.start_y, x, y) {
					return;
				}
				self.drag.moved = true;
				self.layout.begin_drag(&mut self.store, idx);
			}
			let (gx, gy) = self.screen_to_graph(x, y);
			self.layout.pin(&mut self.store, idx, gx, gy);
		} else if self.pan.active {
			if !self.pan.moved && !beyond_slop(self.pan.start_x, self.pan.start_y, x, y) {
				return;
			}
			self.pan.moved = true;
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		} else {
			self.hover = self.node_at_position(x, y);
		}
	}

	pub fn pointer_up(&mut self) -> PointerOutcome {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		if drag.active {
			let Some(idx) = drag.node_idx else {
				return PointerOutcome::None;
			};
			if drag.moved {
				self.layout.end_drag(&mut self.store, idx);
				return PointerOutcome::None;
			}
			return PointerOutcome::NodeClick(self.click_node(idx));
		}
		if pan.active && !pan.moved {
			return PointerOutcome::BackgroundClick;
		}
		PointerOutcome::None
	}

	/// Abandons any gesture in progress without producing a click.
	pub fn pointer_leave(&mut self) {
		if let (true, Some(idx)) = (self.drag.moved, self.drag.node_idx) {
			self.layout.end_drag(&mut self.store, idx);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = None;
	}

	pub fn double_click(&self, x: f64, y: f64) -> Option<DoubleClickAction> {
		self.node_at_position(x, y)
			.map(|idx| double_click_action(self.store.node(idx)))
	}

	pub fn wheel(&mut self, delta_y: f64, x: f64, y: f64) {
		let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
		let (min, max) = (self.config().zoom_min, self.config().zoom_max);
		self.transform.zoom_at(factor, x, y, min, max);
	}

	/// Zooms around the viewport center.
	pub fn zoom_by(&mut self, factor: f64) {
		let (min, max) = (self.config().zoom_min, self.config().zoom_max);
		let (cx, cy) = (self.width / 2.0, self.height / 2.0);
		self.transform.zoom_at(factor, cx, cy, min, max);
	}

	/// Fits every node into the viewport; falls back to the identity transform.
	pub fn reset_zoom(&mut self) {
		let (min, max) = (self.config().zoom_min, self.config().zoom_max);
		self.transform = self
			.bounds()
			.and_then(|b| ViewTransform::fit(b, self.width, self.height, min, max))
			.unwrap_or_default();
	}

	fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
		let mut nodes = self.store.nodes().iter();
		let first = nodes.next()?;
		Some(nodes.fold((first.x, first.y, first.x, first.y), |(x0, y0, x1, y1), n| {
			(x0.min(n.x), y0.min(n.y), x1.max(n.x), y1.max(n.y))
		}))
	}

	/// Applies a page command. Returns true when the selection changed.
	pub fn command(&mut self, command: &GraphCommand) -> bool {
		match command {
			GraphCommand::ZoomBy(factor) => {
				self.zoom_by(*factor);
				false
			}
			GraphCommand::ResetZoom => {
				self.reset_zoom();
				false
			}
			GraphCommand::ClearSelection => self.clear_selection(),
		}
	}

	pub fn tick(&mut self) -> bool {
		self.layout.tick(&mut self.store)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		if (width, height) == (self.width, self.height) {
			return;
		}
		self.width = width;
		self.height = height;
		self.layout.resize(width, height);
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Value;

	use super::*;
	use crate::components::force_graph::interaction::NODE_OPACITY_SEARCH_MISS;
	use crate::components::force_graph::store::tests::node;
	use crate::components::force_graph::types::GraphLink;

	fn data(ids: &[&str], links: &[(&str, &str)]) -> GraphData {
		GraphData {
			nodes: ids.iter().map(|id| node(id, &format!("N{id}"), "Person")).collect(),
			links: links.iter().map(|(s, t)| GraphLink::new(*s, *t, "knows")).collect(),
			focus: None,
		}
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(GraphConfig::explorer(), StyleTable::EXPLORER, 800.0, 600.0)
	}

	/// Screen position of the node with `id` under the current transform.
	fn screen_of(s: &ForceGraphState, id: &str) -> (f64, f64) {
		let n = s.store.lookup(&NodeId::from(id)).unwrap();
		let t = s.transform;
		(n.x * t.k + t.x, n.y * t.k + t.y)
	}

	fn click(s: &mut ForceGraphState, id: &str) -> PointerOutcome {
		let (x, y) = screen_of(s, id);
		s.pointer_down(x, y);
		s.pointer_up()
	}

	#[test]
	fn clicking_a_node_twice_leaves_nothing_selected() {
		let mut s = state();
		s.load(&data(&["1", "2"], &[("1", "2")]));
		let first = click(&mut s, "1");
		assert!(matches!(first, PointerOutcome::NodeClick(Some(ref n)) if n.id == NodeId::from("1")));
		assert!(s.scene.node(&NodeId::from("1")).unwrap().selected);

		assert_eq!(click(&mut s, "1"), PointerOutcome::NodeClick(None));
		assert_eq!(s.selection, Selection::Unselected);
		assert!(s.scene.nodes().iter().all(|p| !p.selected));
		assert!(s.selected_node().is_none());
	}

	#[test]
	fn clicking_another_node_moves_the_highlight() {
		let mut s = state();
		s.load(&data(&["1", "2"], &[("1", "2")]));
		click(&mut s, "1");
		click(&mut s, "2");
		assert!(!s.scene.node(&NodeId::from("1")).unwrap().selected);
		assert!(s.scene.node(&NodeId::from("2")).unwrap().selected);
	}

	#[test]
	fn dragging_moves_and_releases_without_selecting() {
		let mut s = state();
		s.load(&data(&["1", "2"], &[("1", "2")]));
		let (x, y) = screen_of(&s, "1");
		s.pointer_down(x, y);
		s.pointer_move(x + 40.0, y + 10.0);
		let n = s.store.lookup(&NodeId::from("1")).unwrap();
		assert_eq!((n.fx, n.fy), (Some(x + 40.0), Some(y + 10.0)));
		assert_eq!(s.pointer_up(), PointerOutcome::None);
		assert!(!s.store.lookup(&NodeId::from("1")).unwrap().is_pinned());
		assert_eq!(s.selection, Selection::Unselected);
	}

	#[test]
	fn jitter_within_slop_is_still_a_click() {
		let mut s = state();
		s.load(&data(&["1"], &[]));
		let (x, y) = screen_of(&s, "1");
		s.pointer_down(x, y);
		s.pointer_move(x + 1.0, y + 1.0);
		assert!(matches!(s.pointer_up(), PointerOutcome::NodeClick(Some(_))));
		assert!(!s.store.node(0).is_pinned());
	}

	#[test]
	fn background_press_pans_or_clicks() {
		let mut s = state();
		s.load(&data(&["1"], &[]));
		s.pointer_down(5.0, 5.0);
		assert_eq!(s.pointer_up(), PointerOutcome::BackgroundClick);

		s.pointer_down(5.0, 5.0);
		s.pointer_move(55.0, 25.0);
		assert_eq!(s.pointer_up(), PointerOutcome::None);
		assert_eq!((s.transform.x, s.transform.y), (50.0, 20.0));
	}

	#[test]
	fn selection_survives_reload_when_node_remains() {
		let mut s = state();
		s.load(&data(&["1", "2"], &[("1", "2")]));
		click(&mut s, "2");
		let before = s.store.lookup(&NodeId::from("2")).map(|n| (n.x, n.y)).unwrap();
		let outcome = s.load(&data(&["2", "3"], &[("2", "3")]));
		assert!(!outcome.selection_lost);
		assert_eq!(s.selection.selected(), Some(&NodeId::from("2")));
		assert!(s.scene.node(&NodeId::from("2")).unwrap().selected);
		let after = s.store.lookup(&NodeId::from("2")).map(|n| (n.x, n.y)).unwrap();
		assert_eq!(before, after);

		let outcome = s.load(&data(&["3"], &[]));
		assert!(outcome.selection_lost);
		assert_eq!(s.selection, Selection::Unselected);
	}

	#[test]
	fn focus_pin_is_released_only_for_its_own_view() {
		let mut s = state();
		let mut d = data(&["1", "2"], &[("1", "2")]);
		d.focus = Some(NodeId::from("2"));
		let pin = s.load(&d).focus.unwrap();
		let n = s.store.lookup(&NodeId::from("2")).unwrap();
		assert_eq!((n.fx, n.fy), (Some(400.0), Some(300.0)));
		assert!(s.release_focus(&pin));
		assert!(!s.store.lookup(&NodeId::from("2")).unwrap().is_pinned());

		let pin = s.load(&d).focus.unwrap();
		s.load(&d);
		assert!(!s.release_focus(&pin));
	}

	#[test]
	fn zoom_commands_respect_extent() {
		let mut s = state();
		s.load(&data(&["1", "2"], &[("1", "2")]));
		for _ in 0..40 {
			s.command(&GraphCommand::ZoomBy(1.2));
		}
		assert_eq!(s.transform.k, 5.0);
		for _ in 0..40 {
			s.wheel(120.0, 10.0, 10.0);
		}
		assert_eq!(s.transform.k, 0.2);
		s.command(&GraphCommand::ResetZoom);
		assert!(s.transform.k >= 0.2 && s.transform.k <= 5.0);
	}

	#[test]
	fn clear_selection_command_reports_change() {
		let mut s = state();
		s.load(&data(&["1"], &[]));
		assert!(!s.command(&GraphCommand::ClearSelection));
		click(&mut s, "1");
		assert!(s.command(&GraphCommand::ClearSelection));
		assert!(!s.scene.node(&NodeId::from("1")).unwrap().selected);
	}

	#[test]
	fn reused_id_shows_the_new_entity_and_clears_cleanly() {
		let mut s = state();
		let one = |name: &str, t: &str| GraphData {
			nodes: vec![node("0", name, t)],
			links: Vec::new(),
			focus: None,
		};
		s.load(&one("Ada", "Person"));
		click(&mut s, "0");
		s.load(&one("Rome", "Location"));
		let p = s.scene.node(&NodeId::from("0")).unwrap();
		assert_eq!(p.label, "Rome");
		assert_eq!(p.fill, StyleTable::EXPLORER.lookup("Location").fill);

		assert!(s.command(&GraphCommand::ClearSelection));
		assert!(s.scene.nodes().iter().all(|p| !p.selected));
		let reopened = click(&mut s, "0");
		assert!(matches!(reopened, PointerOutcome::NodeClick(Some(ref n)) if n.name == "Rome"));
	}

	#[test]
	fn double_click_resolves_against_node_under_pointer() {
		let mut s = state();
		let mut d = data(&["1"], &[]);
		d.nodes[0].properties.insert("url".into(), Value::from("https://example.org/p/1"));
		s.load(&d);
		let (x, y) = screen_of(&s, "1");
		assert_eq!(
			s.double_click(x, y),
			Some(DoubleClickAction::OpenLink("https://example.org/p/1".into()))
		);
		assert_eq!(s.double_click(-500.0, -500.0), None);
	}

	#[test]
	fn highlight_reaches_loaded_primitives() {
		let mut s = state();
		s.set_highlight(Highlight {
			search: "zzz".into(),
			..Default::default()
		});
		s.load(&data(&["1"], &[]));
		assert_eq!(s.scene.nodes()[0].opacity, NODE_OPACITY_SEARCH_MISS);
	}
}
