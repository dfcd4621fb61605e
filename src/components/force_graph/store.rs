use std::collections::HashMap;

use log::warn;

use super::types::{GraphLink, GraphNode, NodeId, Properties};

/// Type given to nodes synthesized for unresolved edge endpoints.
pub const PLACEHOLDER_TYPE: &str = "Unknown";

/// A node record owned by the store. Position fields belong to the layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub name: String,
	pub node_type: String,
	pub properties: Properties,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Set once the layout has given the node a starting position.
	pub positioned: bool,
	pub placeholder: bool,
}

impl Node {
	fn from_input(node: &GraphNode) -> Self {
		Self {
			id: node.id.clone(),
			name: node.name.clone(),
			node_type: node.node_type.clone(),
			properties: node.properties.clone(),
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			positioned: false,
			placeholder: false,
		}
	}

	fn placeholder(id: &NodeId) -> Self {
		Self {
			id: id.clone(),
			name: id.to_string(),
			node_type: PLACEHOLDER_TYPE.into(),
			properties: Properties::new(),
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			positioned: true,
			placeholder: true,
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}

	/// Back to the input shape, for detail panels and callbacks.
	pub fn to_graph_node(&self) -> GraphNode {
		GraphNode {
			id: self.id.clone(),
			name: self.name.clone(),
			node_type: self.node_type.clone(),
			properties: self.properties.clone(),
		}
	}
}

/// A relation whose endpoints are indices into [`GraphStore::nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: usize,
	pub target: usize,
	pub relation: String,
	pub weight: Option<f64>,
	pub key: String,
}

/// Nodes and resolved edges of the currently loaded view.
#[derive(Debug, Default)]
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<NodeId, usize>,
	generation: u64,
}

impl GraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Discards the current view and loads a new one.
	///
	/// Endpoints missing from `nodes` get a placeholder at the origin; edges whose
	/// resolved endpoints coincide are dropped.
	pub fn replace(&mut self, nodes: &[GraphNode], links: &[GraphLink]) {
		self.nodes.clear();
		self.edges.clear();
		self.index.clear();
		self.generation += 1;

		for node in nodes {
			if self.index.contains_key(&node.id) {
				warn!("duplicate node id {}; keeping the first record", node.id);
				continue;
			}
			self.index.insert(node.id.clone(), self.nodes.len());
			self.nodes.push(Node::from_input(node));
		}

		for link in links {
			let source = self.resolve(&link.source, "source");
			let target = self.resolve(&link.target, "target");
			if source == target {
				continue;
			}
			let key = link.key.clone().unwrap_or_else(|| {
				format!("{}|{}|{}", link.source, link.relation, link.target)
			});
			self.edges.push(Edge {
				source,
				target,
				relation: link.relation.clone(),
				weight: link.weight,
				key,
			});
		}
	}

	fn resolve(&mut self, id: &NodeId, end: &str) -> usize {
		if let Some(&idx) = self.index.get(id) {
			return idx;
		}
		warn!("no node with id {id} for edge {end}; adding a placeholder");
		let idx = self.nodes.len();
		self.index.insert(id.clone(), idx);
		self.nodes.push(Node::placeholder(id));
		idx
	}

	pub fn lookup(&self, id: &NodeId) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn index_of(&self, id: &NodeId) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, idx: usize) -> &Node {
		&self.nodes[idx]
	}

	pub fn node_mut(&mut self, idx: usize) -> &mut Node {
		&mut self.nodes[idx]
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Bumped on every [`replace`](Self::replace); lets deferred work detect a newer view.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.edges.iter().filter_map(move |e| {
			if e.source == idx {
				Some(e.target)
			} else if e.target == idx {
				Some(e.source)
			} else {
				None
			}
		})
	}

	/// Number of edges touching each node, in node order.
	pub fn degrees(&self) -> Vec<usize> {
		let mut deg = vec![0; self.nodes.len()];
		for e in &self.edges {
			deg[e.source] += 1;
			deg[e.target] += 1;
		}
		deg
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	pub(crate) fn node(id: &str, name: &str, node_type: &str) -> GraphNode {
		GraphNode {
			id: NodeId::from(id),
			name: name.into(),
			node_type: node_type.into(),
			properties: Properties::new(),
		}
	}

	#[test]
	fn two_nodes_one_edge_resolve_to_records() {
		let mut store = GraphStore::new();
		store.replace(
			&[node("1", "A", "Person"), node("2", "B", "Person")],
			&[GraphLink::new("1", "2", "knows")],
		);
		assert_eq!(store.node_count(), 2);
		assert_eq!(store.edge_count(), 1);
		let e = &store.edges()[0];
		assert_eq!(store.node(e.source), store.lookup(&NodeId::from("1")).unwrap());
		assert_eq!(store.node(e.target), store.lookup(&NodeId::from("2")).unwrap());
		assert_eq!(e.key, "1|knows|2");
	}

	#[test]
	fn missing_endpoint_becomes_placeholder_at_origin() {
		let mut store = GraphStore::new();
		store.replace(&[node("1", "A", "Person")], &[GraphLink::new("1", "99", "cites")]);
		let p = store.lookup(&NodeId::from("99")).expect("placeholder");
		assert!(p.placeholder);
		assert_eq!((p.x, p.y), (0.0, 0.0));
		assert_eq!(p.node_type, PLACEHOLDER_TYPE);
		assert_eq!(store.edge_count(), 1);
	}

	#[test]
	fn self_loops_are_dropped() {
		let mut store = GraphStore::new();
		store.replace(
			&[node("1", "A", "T"), node("2", "B", "T")],
			&[GraphLink::new("1", "1", "self"), GraphLink::new("7", "7", "ghost"), GraphLink::new("2", "1", "x")],
		);
		assert_eq!(store.edge_count(), 1);
		for e in store.edges() {
			assert_ne!(e.source, e.target);
			assert!(e.source < store.node_count() && e.target < store.node_count());
		}
	}

	#[test]
	fn replace_discards_previous_view() {
		let mut store = GraphStore::new();
		store.replace(&[node("1", "A", "T")], &[]);
		let g = store.generation();
		store.replace(&[node("2", "B", "T")], &[]);
		assert!(store.lookup(&NodeId::from("1")).is_none());
		assert!(store.lookup(&NodeId::from("2")).is_some());
		assert_eq!(store.generation(), g + 1);
	}

	#[test]
	fn degrees_and_neighbors() {
		let mut store = GraphStore::new();
		store.replace(
			&[node("a", "A", "T"), node("b", "B", "T"), node("c", "C", "T")],
			&[GraphLink::new("a", "b", "r"), GraphLink::new("c", "a", "r")],
		);
		assert_eq!(store.degrees(), vec![2, 1, 1]);
		let mut n: Vec<_> = store.neighbors(0).collect();
		n.sort();
		assert_eq!(n, vec![1, 2]);
	}
}
