//! Keyed diff between the store and the retained set of visual primitives.
//!
//! Primitives outlive reloads as long as their key survives, so per-primitive
//! state (selection, opacity, identity) is carried across updates.

use std::collections::{HashMap, HashSet};

use super::interaction::{EDGE_LABEL_OPACITY, EDGE_OPACITY, Highlight, NODE_OPACITY};
use super::store::GraphStore;
use super::style::{StyleTable, edge_width, truncate_label};
use super::types::NodeId;

/// Paint order, bottom first. Relations never cover entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
	Edges,
	EdgeLabels,
	Nodes,
	NodeLabels,
}

pub const PAINT_ORDER: [Layer; 4] = [Layer::Edges, Layer::EdgeLabels, Layer::Nodes, Layer::NodeLabels];

/// Circle plus its label. Both share the node's key.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePrimitive {
	pub uid: u64,
	pub key: NodeId,
	/// Index of the bound record in the store; refreshed on every reconcile.
	pub binding: usize,
	pub radius: f64,
	pub fill: &'static str,
	pub label: String,
	pub selected: bool,
	pub opacity: f64,
}

/// Line plus its relation label.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgePrimitive {
	pub uid: u64,
	pub key: String,
	pub binding: usize,
	pub width: f64,
	pub label: String,
	pub opacity: f64,
	pub label_opacity: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffCount {
	pub added: usize,
	pub removed: usize,
	pub kept: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
	pub nodes: DiffCount,
	pub edges: DiffCount,
}

#[derive(Debug, Default)]
pub struct Scene {
	nodes: Vec<NodePrimitive>,
	edges: Vec<EdgePrimitive>,
	/// Store index to position in `nodes`.
	by_binding: Vec<usize>,
	next_uid: u64,
}

impl Scene {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &[NodePrimitive] {
		&self.nodes
	}

	pub fn edges(&self) -> &[EdgePrimitive] {
		&self.edges
	}

	pub fn node(&self, key: &NodeId) -> Option<&NodePrimitive> {
		self.nodes.iter().find(|p| &p.key == key)
	}

	/// Primitive bound to the store record at `binding`.
	pub fn node_at(&self, binding: usize) -> Option<&NodePrimitive> {
		self.by_binding.get(binding).and_then(|&i| self.nodes.get(i))
	}

	fn node_mut(&mut self, key: &NodeId) -> Option<&mut NodePrimitive> {
		self.nodes.iter_mut().find(|p| &p.key == key)
	}

	fn uid(&mut self) -> u64 {
		self.next_uid += 1;
		self.next_uid
	}

	/// Brings the primitive set in line with `store`: drops stale keys, creates
	/// missing ones and rebinds the rest without recreating them. Kept
	/// primitives take their label and style from the record they now bind to.
	pub fn reconcile(&mut self, store: &GraphStore, styles: &StyleTable) -> ReconcileReport {
		let mut report = ReconcileReport::default();

		let live: HashSet<&NodeId> = store.nodes().iter().map(|n| &n.id).collect();
		let before = self.nodes.len();
		self.nodes.retain(|p| live.contains(&p.key));
		report.nodes.removed = before - self.nodes.len();

		let mut existing: HashMap<NodeId, usize> =
			self.nodes.iter().enumerate().map(|(i, p)| (p.key.clone(), i)).collect();
		for (binding, node) in store.nodes().iter().enumerate() {
			let style = styles.lookup(&node.node_type);
			if let Some(&i) = existing.get(&node.id) {
				let p = &mut self.nodes[i];
				p.binding = binding;
				p.radius = style.radius;
				p.fill = style.fill;
				p.label = truncate_label(&node.name);
				report.nodes.kept += 1;
				continue;
			}
			let uid = self.uid();
			existing.insert(node.id.clone(), self.nodes.len());
			self.nodes.push(NodePrimitive {
				uid,
				key: node.id.clone(),
				binding,
				radius: style.radius,
				fill: style.fill,
				label: truncate_label(&node.name),
				selected: false,
				opacity: NODE_OPACITY,
			});
			report.nodes.added += 1;
		}

		let live: HashSet<&str> = store.edges().iter().map(|e| e.key.as_str()).collect();
		let before = self.edges.len();
		self.edges.retain(|p| live.contains(p.key.as_str()));
		report.edges.removed = before - self.edges.len();

		let mut existing: HashMap<String, usize> =
			self.edges.iter().enumerate().map(|(i, p)| (p.key.clone(), i)).collect();
		for (binding, edge) in store.edges().iter().enumerate() {
			if let Some(&i) = existing.get(&edge.key) {
				let p = &mut self.edges[i];
				p.binding = binding;
				p.width = edge_width(edge.weight);
				p.label.clone_from(&edge.relation);
				report.edges.kept += 1;
				continue;
			}
			let uid = self.uid();
			existing.insert(edge.key.clone(), self.edges.len());
			self.edges.push(EdgePrimitive {
				uid,
				key: edge.key.clone(),
				binding,
				width: edge_width(edge.weight),
				label: edge.relation.clone(),
				opacity: EDGE_OPACITY,
				label_opacity: EDGE_LABEL_OPACITY,
			});
			report.edges.added += 1;
		}

		self.by_binding = vec![0; store.node_count()];
		for (i, p) in self.nodes.iter().enumerate() {
			self.by_binding[p.binding] = i;
		}

		report
	}

	pub fn set_selected(&mut self, key: &NodeId, selected: bool) {
		if let Some(p) = self.node_mut(key) {
			p.selected = selected;
		}
	}

	/// Recomputes opacities for every primitive from one highlight predicate.
	pub fn apply_highlight(&mut self, store: &GraphStore, highlight: &Highlight) {
		for p in &mut self.nodes {
			p.opacity = highlight.node_opacity(store.node(p.binding));
		}
		for p in &mut self.edges {
			let edge = &store.edges()[p.binding];
			p.opacity = highlight.edge_opacity(edge, store);
			p.label_opacity = highlight.edge_label_opacity(edge, store);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::interaction::{EDGE_OPACITY_DIMMED, NODE_OPACITY_FILTERED};
	use crate::components::force_graph::store::tests::node;
	use crate::components::force_graph::types::GraphLink;

	fn load(store: &mut GraphStore, scene: &mut Scene, ids: &[&str], links: &[(&str, &str)]) -> ReconcileReport {
		let nodes: Vec<_> = ids.iter().map(|id| node(id, &format!("N{id}"), "Person")).collect();
		let links: Vec<_> = links.iter().map(|(s, t)| GraphLink::new(*s, *t, "knows")).collect();
		store.replace(&nodes, &links);
		scene.reconcile(store, &StyleTable::EXPLORER)
	}

	#[test]
	fn builds_one_primitive_per_node_and_edge() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		let report = load(&mut store, &mut scene, &["1", "2"], &[("1", "2")]);
		assert_eq!(scene.nodes().len(), 2);
		assert_eq!(scene.edges().len(), 1);
		assert_eq!(report.nodes, DiffCount { added: 2, removed: 0, kept: 0 });
		assert_eq!(scene.edges()[0].label, "knows");
	}

	#[test]
	fn reconciling_same_data_twice_is_a_no_op() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		load(&mut store, &mut scene, &["1", "2", "3"], &[("1", "2"), ("2", "3")]);
		let uids: Vec<u64> = scene.nodes().iter().map(|p| p.uid).collect();
		let report = scene.reconcile(&store, &StyleTable::EXPLORER);
		assert_eq!(report.nodes, DiffCount { added: 0, removed: 0, kept: 3 });
		assert_eq!(report.edges, DiffCount { added: 0, removed: 0, kept: 2 });
		assert_eq!(scene.nodes().iter().map(|p| p.uid).collect::<Vec<_>>(), uids);
	}

	#[test]
	fn reload_keeps_surviving_primitives_and_their_state() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		load(&mut store, &mut scene, &["1", "2", "3"], &[("1", "2"), ("2", "3")]);
		scene.set_selected(&NodeId::from("2"), true);
		let uid2 = scene.node(&NodeId::from("2")).unwrap().uid;

		let report = load(&mut store, &mut scene, &["2", "4"], &[("2", "4")]);
		assert_eq!(report.nodes, DiffCount { added: 1, removed: 2, kept: 1 });
		assert_eq!(report.edges, DiffCount { added: 1, removed: 2, kept: 0 });
		let kept = scene.node(&NodeId::from("2")).unwrap();
		assert_eq!(kept.uid, uid2);
		assert!(kept.selected);
		assert_eq!(store.node(kept.binding).id, NodeId::from("2"));
	}

	#[test]
	fn reused_key_takes_the_new_record_look() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		store.replace(&[node("0", "Ada", "Professor")], &[]);
		scene.reconcile(&store, &StyleTable::EXPLORER);
		scene.set_selected(&NodeId::from("0"), true);
		let uid = scene.nodes()[0].uid;

		store.replace(&[node("0", "Rome", "Location")], &[]);
		let report = scene.reconcile(&store, &StyleTable::EXPLORER);
		assert_eq!(report.nodes.kept, 1);
		let p = &scene.nodes()[0];
		assert_eq!(p.label, "Rome");
		assert_eq!(p.fill, StyleTable::EXPLORER.lookup("Location").fill);
		assert_eq!(p.radius, StyleTable::EXPLORER.lookup("Location").radius);
		assert_eq!(p.uid, uid);
		assert!(p.selected);
	}

	#[test]
	fn reused_edge_key_takes_the_new_relation() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		let nodes = [node("1", "A", "Person"), node("2", "B", "Person")];
		let mut link = GraphLink::new("1", "2", "knows");
		link.key = Some("0".into());
		store.replace(&nodes, std::slice::from_ref(&link));
		scene.reconcile(&store, &StyleTable::EXPLORER);

		link.relation = "cites".into();
		link.weight = Some(4.0);
		store.replace(&nodes, &[link]);
		scene.reconcile(&store, &StyleTable::EXPLORER);
		assert_eq!(scene.edges()[0].label, "cites");
		assert_eq!(scene.edges()[0].width, 4.0);
	}

	#[test]
	fn binding_index_follows_reloads() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		load(&mut store, &mut scene, &["1", "2", "3"], &[]);
		load(&mut store, &mut scene, &["3", "4", "1"], &[]);
		for (i, n) in store.nodes().iter().enumerate() {
			assert_eq!(scene.node_at(i).map(|p| &p.key), Some(&n.id));
		}
		assert!(scene.node_at(3).is_none());
	}

	#[test]
	fn every_edge_primitive_has_both_endpoint_primitives() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		load(&mut store, &mut scene, &["1", "2"], &[("1", "2"), ("2", "99"), ("1", "1")]);
		for p in scene.edges() {
			let e = &store.edges()[p.binding];
			assert!(scene.node(&store.node(e.source).id).is_some());
			assert!(scene.node(&store.node(e.target).id).is_some());
			assert_ne!(e.source, e.target);
		}
		assert_eq!(scene.edges().len(), 2);
	}

	#[test]
	fn edges_paint_beneath_nodes() {
		let pos = |l: Layer| PAINT_ORDER.iter().position(|x| *x == l).unwrap();
		assert!(pos(Layer::Edges) < pos(Layer::Nodes));
		assert!(pos(Layer::EdgeLabels) < pos(Layer::Nodes));
	}

	#[test]
	fn highlight_sets_primitive_opacity() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		let nodes = vec![node("1", "Ann", "Person"), node("2", "Acme", "Organization"), node("3", "Rome", "Location")];
		store.replace(&nodes, &[GraphLink::new("1", "2", "r"), GraphLink::new("2", "3", "r")]);
		scene.reconcile(&store, &StyleTable::EXTRACTION);
		let mut hl = Highlight::default();
		hl.hidden_types.insert("Person".into());
		scene.apply_highlight(&store, &hl);
		let op = |id: &str| scene.node(&NodeId::from(id)).unwrap().opacity;
		assert_eq!(op("1"), NODE_OPACITY_FILTERED);
		assert_eq!(op("2"), NODE_OPACITY);
		assert_eq!(scene.edges()[0].opacity, EDGE_OPACITY_DIMMED);
		assert_eq!(scene.edges()[1].opacity, EDGE_OPACITY);
	}

	#[test]
	fn long_names_render_truncated() {
		let (mut store, mut scene) = (GraphStore::new(), Scene::new());
		store.replace(&[node("1", "Abcdefghijklmno", "Paper")], &[]);
		scene.reconcile(&store, &StyleTable::EXPLORER);
		assert_eq!(scene.nodes()[0].label, "Abcdefghij...");
	}
}
