//! Iterative force layout over the store's node records.
//!
//! The forces follow d3-force: many-body repulsion, link springs with a rest
//! length, a centering shift, collision separation and an optional axis pull.
//! Energy (`alpha`) decays each tick and the layout goes idle below `alpha_min`.

use std::f64::consts::PI;

use crate::config::GraphConfig;

use super::store::{GraphStore, Node};

/// Minimum squared distance used by the many-body force.
const DISTANCE_MIN2: f64 = 1.0;
/// Alpha used to resettle after a resize.
const RESIZE_ALPHA: f64 = 0.3;

pub struct ForceLayout {
	config: GraphConfig,
	alpha: f64,
	alpha_target: f64,
	center_x: f64,
	center_y: f64,
	width: f64,
	height: f64,
}

impl ForceLayout {
	pub fn new(config: GraphConfig, width: f64, height: f64) -> Self {
		Self {
			config,
			alpha: 1.0,
			alpha_target: 0.0,
			center_x: width / 2.0,
			center_y: height / 2.0,
			width,
			height,
		}
	}

	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn center(&self) -> (f64, f64) {
		(self.center_x, self.center_y)
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= self.config.alpha_min
	}

	pub fn restart(&mut self, alpha: f64) {
		self.alpha = alpha;
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Gives unplaced nodes a phyllotaxis position around the center and reheats fully.
	pub fn seed(&mut self, store: &mut GraphStore) {
		let (cx, cy) = (self.center_x, self.center_y);
		let golden = PI * (3.0 - 5f64.sqrt());
		for (i, node) in store.nodes_mut().iter_mut().enumerate() {
			node.vx = 0.0;
			node.vy = 0.0;
			if node.positioned {
				continue;
			}
			let radius = 10.0 * (0.5 + i as f64).sqrt();
			let angle = i as f64 * golden;
			node.x = cx + radius * angle.cos();
			node.y = cy + radius * angle.sin();
			node.positioned = true;
		}
		self.alpha_target = 0.0;
		self.restart(1.0);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.center_x = width / 2.0;
		self.center_y = height / 2.0;
		self.restart(RESIZE_ALPHA);
	}

	/// Pins node `idx` at `(x, y)` until [`unpin`](Self::unpin).
	pub fn pin(&self, store: &mut GraphStore, idx: usize, x: f64, y: f64) {
		let node = store.node_mut(idx);
		node.fx = Some(x);
		node.fy = Some(y);
	}

	pub fn unpin(&self, store: &mut GraphStore, idx: usize) {
		let node = store.node_mut(idx);
		node.fx = None;
		node.fy = None;
	}

	/// Pins a node where it stands and keeps the layout warm while it is dragged.
	pub fn begin_drag(&mut self, store: &mut GraphStore, idx: usize) {
		let (x, y) = {
			let n = store.node(idx);
			(n.x, n.y)
		};
		self.pin(store, idx, x, y);
		self.alpha_target = self.config.drag_alpha_target;
		if self.alpha < self.alpha_target {
			self.restart(self.alpha_target);
		}
	}

	pub fn end_drag(&mut self, store: &mut GraphStore, idx: usize) {
		self.alpha_target = 0.0;
		self.unpin(store, idx);
	}

	/// Runs one iteration. Returns false without touching positions when idle.
	pub fn tick(&mut self, store: &mut GraphStore) -> bool {
		if !self.is_running() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(store, alpha);
		self.apply_charge(store.nodes_mut(), alpha);
		if let Some(strength) = self.config.position_strength {
			self.apply_position(store.nodes_mut(), strength * alpha);
		}
		self.apply_collision(store.nodes_mut());

		let decay = 1.0 - self.config.velocity_decay;
		for node in store.nodes_mut() {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= decay;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= decay;
					node.y += node.vy;
				}
			}
		}

		self.apply_center(store.nodes_mut());
		if let Some(margin) = self.config.clamp_margin {
			self.clamp(store.nodes_mut(), margin);
		}
		true
	}

	fn apply_links(&self, store: &mut GraphStore, alpha: f64) {
		let degree = store.degrees();
		let edges: Vec<(usize, usize)> = store.edges().iter().map(|e| (e.source, e.target)).collect();
		let nodes = store.nodes_mut();
		for (k, (s, t)) in edges.into_iter().enumerate() {
			let strength = 1.0 / degree[s].min(degree[t]).max(1) as f64;
			let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;
			let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if dx == 0.0 {
				dx = jiggle(k);
			}
			if dy == 0.0 {
				dy = jiggle(k + 1);
			}
			let len = (dx * dx + dy * dy).sqrt();
			let l = (len - self.config.link_distance) / len * alpha * strength;
			dx *= l;
			dy *= l;
			nodes[t].vx -= dx * bias;
			nodes[t].vy -= dy * bias;
			nodes[s].vx += dx * (1.0 - bias);
			nodes[s].vy += dy * (1.0 - bias);
		}
	}

	fn apply_charge(&self, nodes: &mut [Node], alpha: f64) {
		let strength = self.config.charge_strength;
		let n = nodes.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = nodes[j].x - nodes[i].x;
				let mut dy = nodes[j].y - nodes[i].y;
				if dx == 0.0 {
					dx = jiggle(i + j);
				}
				if dy == 0.0 {
					dy = jiggle(i + j + 1);
				}
				let mut l = dx * dx + dy * dy;
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				let w = strength * alpha / l;
				nodes[i].vx += dx * w;
				nodes[i].vy += dy * w;
				nodes[j].vx -= dx * w;
				nodes[j].vy -= dy * w;
			}
		}
	}

	fn apply_position(&self, nodes: &mut [Node], k: f64) {
		for node in nodes {
			node.vx += (self.center_x - node.x) * k;
			node.vy += (self.center_y - node.y) * k;
		}
	}

	fn apply_collision(&self, nodes: &mut [Node]) {
		let r = self.config.collision_radius;
		let min_dist = 2.0 * r;
		let n = nodes.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = nodes[i].x + nodes[i].vx - nodes[j].x - nodes[j].vx;
				let mut dy = nodes[i].y + nodes[i].vy - nodes[j].y - nodes[j].vy;
				let mut l = dx * dx + dy * dy;
				if l >= min_dist * min_dist {
					continue;
				}
				if dx == 0.0 {
					dx = jiggle(i + j);
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = jiggle(i + j + 1);
					l += dy * dy;
				}
				let len = l.sqrt();
				let push = (min_dist - len) / len * 0.5;
				dx *= push;
				dy *= push;
				nodes[i].vx += dx;
				nodes[i].vy += dy;
				nodes[j].vx -= dx;
				nodes[j].vy -= dy;
			}
		}
	}

	fn apply_center(&self, nodes: &mut [Node]) {
		if nodes.is_empty() {
			return;
		}
		let n = nodes.len() as f64;
		let (sx, sy) = nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let strength = self.config.center_strength;
		let shift_x = (sx / n - self.center_x) * strength;
		let shift_y = (sy / n - self.center_y) * strength;
		for node in nodes.iter_mut().filter(|n| !n.is_pinned()) {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	fn clamp(&self, nodes: &mut [Node], margin: f64) {
		let (x_max, y_max) = ((self.width - margin).max(margin), (self.height - margin).max(margin));
		for node in nodes.iter_mut().filter(|n| !n.is_pinned()) {
			node.x = node.x.clamp(margin, x_max);
			node.y = node.y.clamp(margin, y_max);
		}
	}
}

/// Deterministic tiny offset that separates coincident points.
fn jiggle(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64 / 233280.0 - 0.5) * 1e-6
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::store::tests::node;
	use crate::components::force_graph::types::{GraphLink, NodeId};

	fn seeded(nodes: usize, links: &[(usize, usize)]) -> (ForceLayout, GraphStore) {
		let mut store = GraphStore::new();
		let ns: Vec<_> = (0..nodes).map(|i| node(&i.to_string(), "n", "T")).collect();
		let ls: Vec<_> = links
			.iter()
			.map(|(s, t)| GraphLink::new(s.to_string(), t.to_string(), "r"))
			.collect();
		store.replace(&ns, &ls);
		let mut layout = ForceLayout::new(GraphConfig::explorer(), 800.0, 600.0);
		layout.seed(&mut store);
		(layout, store)
	}

	fn dist(store: &GraphStore, a: usize, b: usize) -> f64 {
		let (p, q) = (store.node(a), store.node(b));
		(p.x - q.x).hypot(p.y - q.y)
	}

	#[test]
	fn alpha_decays_until_idle() {
		let (mut layout, mut store) = seeded(3, &[(0, 1), (1, 2)]);
		let mut ticks = 0;
		let mut last = layout.alpha();
		while layout.tick(&mut store) {
			assert!(layout.alpha() < last);
			last = layout.alpha();
			ticks += 1;
			assert!(ticks < 10_000);
		}
		assert!(!layout.is_running());
		// 0.98^n < 0.001 after roughly 342 ticks
		assert!((300..400).contains(&ticks), "{ticks}");
		let before = store.node(0).x;
		assert!(!layout.tick(&mut store));
		assert_eq!(store.node(0).x, before);
	}

	#[test]
	fn linked_pair_settles_near_rest_length() {
		let (mut layout, mut store) = seeded(2, &[(0, 1)]);
		while layout.tick(&mut store) {}
		let d = dist(&store, 0, 1);
		assert!(d > 100.0 && d < 400.0, "{d}");
	}

	#[test]
	fn unlinked_nodes_keep_collision_distance() {
		let (mut layout, mut store) = seeded(6, &[]);
		while layout.tick(&mut store) {}
		for a in 0..6 {
			for b in (a + 1)..6 {
				assert!(dist(&store, a, b) >= 2.0 * 22.5 * 0.9);
			}
		}
	}

	#[test]
	fn pinned_node_stays_put_while_others_move() {
		let (mut layout, mut store) = seeded(3, &[(0, 1), (0, 2)]);
		layout.begin_drag(&mut store, 0);
		layout.pin(&mut store, 0, 10.0, 20.0);
		let other = (store.node(1).x, store.node(1).y);
		for _ in 0..50 {
			layout.tick(&mut store);
		}
		assert_eq!((store.node(0).x, store.node(0).y), (10.0, 20.0));
		assert_ne!((store.node(1).x, store.node(1).y), other);
		// dragging holds alpha up at the drag target
		assert!(layout.alpha() > 0.29);
		layout.end_drag(&mut store, 0);
		assert!(!store.node(0).is_pinned());
	}

	#[test]
	fn drag_reheats_an_idle_layout() {
		let (mut layout, mut store) = seeded(2, &[(0, 1)]);
		while layout.tick(&mut store) {}
		layout.begin_drag(&mut store, 1);
		assert!(layout.is_running());
	}

	#[test]
	fn seed_places_nodes_around_center_and_keeps_placeholders() {
		let mut store = GraphStore::new();
		store.replace(&[node("1", "A", "T")], &[GraphLink::new("1", "99", "r")]);
		let mut layout = ForceLayout::new(GraphConfig::explorer(), 800.0, 600.0);
		layout.seed(&mut store);
		let a = store.lookup(&NodeId::from("1")).unwrap();
		assert!((a.x - 400.0).abs() < 20.0 && (a.y - 300.0).abs() < 20.0);
		let p = store.lookup(&NodeId::from("99")).unwrap();
		assert_eq!((p.x, p.y), (0.0, 0.0));
	}

	#[test]
	fn clamp_keeps_nodes_inside_margin() {
		let mut store = GraphStore::new();
		let ns: Vec<_> = (0..30).map(|i| node(&i.to_string(), "n", "T")).collect();
		store.replace(&ns, &[]);
		let mut layout = ForceLayout::new(GraphConfig::extraction(), 300.0, 200.0);
		layout.seed(&mut store);
		for _ in 0..100 {
			layout.tick(&mut store);
		}
		for n in store.nodes() {
			assert!(n.x >= 50.0 && n.x <= 250.0);
			assert!(n.y >= 50.0 && n.y <= 150.0);
		}
	}
}
