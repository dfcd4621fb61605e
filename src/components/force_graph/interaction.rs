use std::collections::BTreeSet;

use super::store::{Edge, GraphStore, Node};
use super::types::NodeId;

/// Pointer travel (screen px) below which a press/release pair counts as a click.
pub const CLICK_SLOP: f64 = 3.0;

pub const NODE_OPACITY: f64 = 1.0;
pub const NODE_OPACITY_SEARCH_MISS: f64 = 0.2;
pub const NODE_OPACITY_FILTERED: f64 = 0.1;
pub const EDGE_OPACITY: f64 = 0.6;
pub const EDGE_OPACITY_DIMMED: f64 = 0.1;
pub const EDGE_LABEL_OPACITY: f64 = 1.0;
pub const EDGE_LABEL_OPACITY_DIMMED: f64 = 0.2;

/// At most one selected node.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Selection {
	#[default]
	Unselected,
	Selected(NodeId),
}

/// What a click changed: the node to restore and the node to highlight.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionChange {
	pub restore: Option<NodeId>,
	pub select: Option<NodeId>,
}

impl Selection {
	pub fn selected(&self) -> Option<&NodeId> {
		match self {
			Selection::Unselected => None,
			Selection::Selected(id) => Some(id),
		}
	}

	/// Clicking the selected node deselects it; clicking any other node moves the selection.
	pub fn click(&mut self, id: &NodeId) -> SelectionChange {
		let restore = self.selected().cloned();
		if restore.as_ref() == Some(id) {
			*self = Selection::Unselected;
			return SelectionChange { restore, select: None };
		}
		*self = Selection::Selected(id.clone());
		SelectionChange {
			restore,
			select: Some(id.clone()),
		}
	}

	pub fn clear(&mut self) -> SelectionChange {
		let restore = self.selected().cloned();
		*self = Selection::Unselected;
		SelectionChange { restore, select: None }
	}
}

/// Search-term and type-filter highlighting. Never removes data, only dims it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
	pub search: String,
	pub hidden_types: BTreeSet<String>,
}

impl Highlight {
	fn term(&self) -> Option<String> {
		let t = self.search.trim();
		(!t.is_empty()).then(|| t.to_lowercase())
	}

	fn name_matches(term: &Option<String>, node: &Node) -> bool {
		term.as_ref()
			.is_none_or(|t| node.name.to_lowercase().contains(t.as_str()))
	}

	fn type_visible(&self, node: &Node) -> bool {
		!self.hidden_types.contains(&node.node_type)
	}

	pub fn node_opacity(&self, node: &Node) -> f64 {
		let term = self.term();
		let search = if Self::name_matches(&term, node) {
			NODE_OPACITY
		} else {
			NODE_OPACITY_SEARCH_MISS
		};
		let filter = if self.type_visible(node) {
			NODE_OPACITY
		} else {
			NODE_OPACITY_FILTERED
		};
		search.min(filter)
	}

	fn edge_state(&self, edge: &Edge, store: &GraphStore) -> (bool, bool) {
		let term = self.term();
		let (s, t) = (store.node(edge.source), store.node(edge.target));
		let search_hit = term.is_none() || Self::name_matches(&term, s) || Self::name_matches(&term, t);
		let filter_hit = self.type_visible(s) && self.type_visible(t);
		(search_hit, filter_hit)
	}

	pub fn edge_opacity(&self, edge: &Edge, store: &GraphStore) -> f64 {
		match self.edge_state(edge, store) {
			(true, true) => EDGE_OPACITY,
			_ => EDGE_OPACITY_DIMMED,
		}
	}

	pub fn edge_label_opacity(&self, edge: &Edge, store: &GraphStore) -> f64 {
		match self.edge_state(edge, store) {
			(true, true) => EDGE_LABEL_OPACITY,
			_ => EDGE_LABEL_OPACITY_DIMMED,
		}
	}
}

/// Pan/zoom transform applied to the root drawing layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scales by `factor` keeping the screen point `(ax, ay)` fixed.
	pub fn zoom_at(&mut self, factor: f64, ax: f64, ay: f64, min: f64, max: f64) {
		let new_k = (self.k * factor).clamp(min, max);
		let ratio = new_k / self.k;
		self.x = ax - (ax - self.x) * ratio;
		self.y = ay - (ay - self.y) * ratio;
		self.k = new_k;
	}

	/// Transform that fits `bounds` (min x, min y, max x, max y) into a
	/// `width × height` viewport with a 10% margin.
	pub fn fit(bounds: (f64, f64, f64, f64), width: f64, height: f64, min: f64, max: f64) -> Option<Self> {
		let (x0, y0, x1, y1) = bounds;
		let (w, h) = (x1 - x0, y1 - y0);
		if w <= 0.0 || h <= 0.0 || width <= 0.0 || height <= 0.0 {
			return None;
		}
		let k = (0.9 / (w / width).max(h / height)).clamp(min, max);
		let (mx, my) = (x0 + w / 2.0, y0 + h / 2.0);
		Some(Self {
			x: width / 2.0 - k * mx,
			y: height / 2.0 - k * my,
			k,
		})
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	/// Becomes true once the pointer leaves the click slop.
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

pub fn beyond_slop(x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
	(x1 - x0).hypot(y1 - y0) > CLICK_SLOP
}

/// Outcome of a double-click on a node. Exactly one applies per click.
#[derive(Clone, Debug, PartialEq)]
pub enum DoubleClickAction {
	OpenLink(String),
	Expand(NodeId),
}

pub fn double_click_action(node: &Node) -> DoubleClickAction {
	match node.to_graph_node().external_link() {
		Some(url) => DoubleClickAction::OpenLink(url.to_owned()),
		None => DoubleClickAction::Expand(node.id.clone()),
	}
}
