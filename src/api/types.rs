//! Wire shapes of the knowledge-graph API and their conversions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::components::force_graph::{GraphData, GraphLink, GraphNode, NodeId, Properties};

/// Shown when a node has neither title nor name.
pub const UNNAMED: &str = "Unnamed node";

#[derive(Clone, Debug, Deserialize)]
pub struct WireNode {
	pub id: NodeId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(rename = "type", default)]
	pub node_type: Option<String>,
	#[serde(default)]
	pub properties: Properties,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireLink {
	pub source: NodeId,
	pub target: NodeId,
	#[serde(rename = "type", default)]
	pub relation: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub value: Option<f64>,
}

/// Body of `/api/graph` and `/api/graph/subgraph/{n}`. Both arrays are required.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphPayload {
	pub nodes: Vec<WireNode>,
	pub links: Vec<WireLink>,
}

impl From<GraphPayload> for GraphData {
	fn from(payload: GraphPayload) -> Self {
		let nodes = payload
			.nodes
			.into_iter()
			.map(|n| GraphNode {
				name: n
					.name
					.or_else(|| n.properties.get("title").and_then(|v| v.as_str()).map(str::to_owned))
					.unwrap_or_else(|| n.id.to_string()),
				node_type: n.node_type.unwrap_or_else(|| "Unknown".into()),
				id: n.id,
				properties: n.properties,
			})
			.collect();
		let links = payload
			.links
			.into_iter()
			.map(|l| GraphLink {
				relation: l.label.or(l.relation).unwrap_or_default(),
				source: l.source,
				target: l.target,
				weight: l.value,
				key: None,
			})
			.collect();
		GraphData {
			nodes,
			links,
			focus: None,
		}
	}
}

/// Category list endpoints answer with a bare array or an object.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TypeList {
	Bare(Vec<String>),
	Wrapped {
		#[serde(default)]
		types: Vec<String>,
		#[serde(default)]
		type_details: Vec<TypeCount>,
	},
}

impl TypeList {
	pub fn into_types(self) -> Vec<String> {
		match self {
			TypeList::Bare(types) | TypeList::Wrapped { types, .. } => types,
		}
	}

	/// Per-type counts when the server sent them.
	pub fn details(&self) -> &[TypeCount] {
		match self {
			TypeList::Bare(_) => &[],
			TypeList::Wrapped { type_details, .. } => type_details,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TypeCount {
	#[serde(rename = "type", default)]
	pub type_name: String,
	#[serde(default)]
	pub count: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Stats {
	#[serde(alias = "nodeCount", default)]
	pub node_count: u64,
	#[serde(alias = "relationCount", default)]
	pub relation_count: u64,
	#[serde(default)]
	pub node_types: Vec<TypeCount>,
	#[serde(default)]
	pub relation_types: Vec<TypeCount>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AdminNode {
	pub id: NodeId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub display_name: Option<String>,
	#[serde(rename = "type", default)]
	pub node_type: Option<String>,
	#[serde(default)]
	pub prop_count: Option<u64>,
	#[serde(default)]
	pub properties: Properties,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
	s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AdminNode {
	/// Title, then name, then the server's display name.
	pub fn display_name(&self) -> &str {
		non_empty(&self.title)
			.or_else(|| non_empty(&self.name))
			.or_else(|| non_empty(&self.display_name))
			.unwrap_or(UNNAMED)
	}

	pub fn type_name(&self) -> &str {
		non_empty(&self.node_type).unwrap_or("Unknown")
	}

	pub fn property_count(&self) -> u64 {
		self.prop_count.unwrap_or(self.properties.len() as u64)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NodePage {
	#[serde(default)]
	pub nodes: Vec<AdminNode>,
	#[serde(default = "one")]
	pub page: u32,
	#[serde(default = "one")]
	pub pages: u32,
	#[serde(default)]
	pub total: u64,
}

fn one() -> u32 {
	1
}

/// Create/update body for a node.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NodeBody {
	pub name: String,
	pub title: String,
	#[serde(rename = "type")]
	pub node_type: String,
	pub properties: Properties,
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Ack {
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelationRow {
	pub source_id: NodeId,
	#[serde(default)]
	pub source_name: Option<String>,
	#[serde(default)]
	pub source_type: Option<String>,
	#[serde(rename = "type", default)]
	pub relation_type: String,
	pub target_id: NodeId,
	#[serde(default)]
	pub target_name: Option<String>,
	#[serde(default)]
	pub target_type: Option<String>,
}

impl RelationRow {
	pub fn source_label(&self) -> String {
		endpoint_label(&self.source_name, &self.source_type)
	}

	pub fn target_label(&self) -> String {
		endpoint_label(&self.target_name, &self.target_type)
	}
}

fn endpoint_label(name: &Option<String>, node_type: &Option<String>) -> String {
	let name = non_empty(name).unwrap_or(UNNAMED);
	match non_empty(node_type) {
		Some(t) => format!("{name} ({t})"),
		None => name.to_owned(),
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelationPage {
	#[serde(default)]
	pub relations: Vec<RelationRow>,
	#[serde(default = "one")]
	pub pages: u32,
}

/// Identifies a relation by its endpoints and type.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelationKey {
	pub source_node_id: NodeId,
	pub target_node_id: NodeId,
	pub relation_type: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRelationBody {
	pub source_node_id: NodeId,
	pub target_node_id: NodeId,
	#[serde(rename = "type")]
	pub relation_type: String,
	pub properties: Properties,
	/// Type being replaced when editing an existing relation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub original_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RelationProperties {
	#[serde(default)]
	pub properties: Properties,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchHit {
	pub id: NodeId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(rename = "type", default)]
	pub node_type: Option<String>,
}

impl SearchHit {
	pub fn label(&self) -> String {
		let name = non_empty(&self.title).or_else(|| non_empty(&self.name)).unwrap_or(UNNAMED);
		endpoint_label(&Some(name.to_owned()), &self.node_type)
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SearchResults {
	#[serde(default)]
	pub nodes: Vec<SearchHit>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Entity {
	pub name: String,
	#[serde(rename = "type", default = "other_type")]
	pub entity_type: String,
	#[serde(default, skip_serializing_if = "Properties::is_empty")]
	pub properties: Properties,
}

fn other_type() -> String {
	"Other".into()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Triple {
	pub source: String,
	pub target: String,
	pub relation: String,
}

/// Entities and relations extracted from text, as sent back to be saved.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Extraction {
	#[serde(default)]
	pub entities: Vec<Entity>,
	#[serde(default)]
	pub relations: Vec<Triple>,
}

impl Extraction {
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty() && self.relations.is_empty()
	}

	/// Relations whose source or target is `name`.
	pub fn relations_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Triple> + 'a {
		self.relations
			.iter()
			.filter(move |r| r.source == name || r.target == name)
	}

	/// Graph view of the extraction.
	///
	/// Entities become nodes keyed by name; a repeated name keeps its first
	/// entity. Relations refer to entities by name, so a name with no entity
	/// becomes a placeholder downstream. Repeated triples collapse into one
	/// weighted link keyed by the position of its first occurrence.
	/// Self-relations are skipped.
	pub fn to_graph(&self) -> GraphData {
		let mut names: HashSet<&str> = HashSet::new();
		let nodes: Vec<GraphNode> = self
			.entities
			.iter()
			.filter(|e| names.insert(e.name.as_str()))
			.map(|e| GraphNode {
				id: NodeId::new(e.name.as_str()),
				name: e.name.clone(),
				node_type: e.entity_type.clone(),
				properties: e.properties.clone(),
			})
			.collect();

		let mut links: Vec<GraphLink> = Vec::new();
		let mut seen: HashMap<&Triple, usize> = HashMap::new();
		for (i, r) in self.relations.iter().enumerate() {
			if r.source == r.target {
				continue;
			}
			if let Some(&at) = seen.get(r) {
				let w = links[at].weight.get_or_insert(1.0);
				*w += 1.0;
				continue;
			}
			seen.insert(r, links.len());
			links.push(GraphLink {
				source: NodeId::new(r.source.as_str()),
				target: NodeId::new(r.target.as_str()),
				relation: r.relation.clone(),
				weight: None,
				key: Some(i.to_string()),
			});
		}

		GraphData {
			nodes,
			links,
			focus: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn graph_payload_maps_labels_and_weights() {
		let payload: GraphPayload = serde_json::from_value(json!({
			"nodes": [
				{"id": "4:x:1", "name": "Ada", "type": "Professor", "properties": {"url": "http://a"}},
				{"id": "4:x:2", "type": "Paper", "properties": {"title": "On Graphs"}}
			],
			"links": [{"source": "4:x:1", "target": "4:x:2", "type": "WROTE", "label": "wrote", "value": 2.0}]
		}))
		.unwrap();
		let data = GraphData::from(payload);
		assert_eq!(data.nodes[1].name, "On Graphs");
		assert_eq!(data.links[0].relation, "wrote");
		assert_eq!(data.links[0].weight, Some(2.0));
	}

	#[test]
	fn graph_payload_requires_both_arrays() {
		assert!(serde_json::from_value::<GraphPayload>(json!({"nodes": []})).is_err());
	}

	#[test]
	fn type_lists_decode_in_both_shapes() {
		let bare: TypeList = serde_json::from_str(r#"["A","B"]"#).unwrap();
		assert_eq!(bare.into_types(), vec!["A", "B"]);
		let wrapped: TypeList =
			serde_json::from_str(r#"{"types":["A"],"type_details":[{"type":"A","count":3}]}"#).unwrap();
		assert_eq!(wrapped.details()[0].count, 3);
		assert_eq!(wrapped.into_types(), vec!["A"]);
	}

	#[test]
	fn stats_accept_camel_case_counts() {
		let s: Stats = serde_json::from_str(r#"{"nodeCount": 5, "relationCount": 7}"#).unwrap();
		assert_eq!((s.node_count, s.relation_count), (5, 7));
		let s: Stats = serde_json::from_str(
			r#"{"node_count": 2, "relation_count": 1, "node_types": [{"type": "Paper", "count": 2}]}"#,
		)
		.unwrap();
		assert_eq!(s.node_types[0].type_name, "Paper");
	}

	#[test]
	fn display_name_prefers_title_then_name() {
		let mut n: AdminNode = serde_json::from_value(json!({"id": 3, "name": "ada", "title": ""})).unwrap();
		assert_eq!(n.display_name(), "ada");
		n.title = Some("Prof. Ada".into());
		assert_eq!(n.display_name(), "Prof. Ada");
		n.title = None;
		n.name = None;
		assert_eq!(n.display_name(), UNNAMED);
		assert_eq!(n.type_name(), "Unknown");
	}

	#[test]
	fn relation_bodies_use_camel_case_keys() {
		let body = SaveRelationBody {
			source_node_id: NodeId::from("1"),
			target_node_id: NodeId::from("2"),
			relation_type: "CITES".into(),
			properties: Properties::new(),
			original_type: None,
		};
		let v = serde_json::to_value(&body).unwrap();
		assert_eq!(v, json!({"sourceNodeId": "1", "targetNodeId": "2", "type": "CITES", "properties": {}}));
		let key = serde_json::to_value(RelationKey {
			source_node_id: NodeId::from("1"),
			target_node_id: NodeId::from("2"),
			relation_type: "CITES".into(),
		})
		.unwrap();
		assert_eq!(key["relationType"], "CITES");
	}

	#[test]
	fn relation_rows_label_endpoints() {
		let row: RelationRow = serde_json::from_value(json!({
			"source_id": 1, "source_name": "Ada", "source_type": "Person",
			"type": "KNOWS", "target_id": 2, "target_name": null, "target_type": null
		}))
		.unwrap();
		assert_eq!(row.source_label(), "Ada (Person)");
		assert_eq!(row.target_label(), UNNAMED);
	}

	fn extraction() -> Extraction {
		serde_json::from_value(json!({
			"entities": [
				{"name": "Ada", "type": "Person"},
				{"name": "Acme", "type": "Organization"}
			],
			"relations": [
				{"source": "Ada", "target": "Acme", "relation": "works_at"},
				{"source": "Ada", "target": "Acme", "relation": "works_at"},
				{"source": "Ada", "target": "Ada", "relation": "is"},
				{"source": "Acme", "target": "Rome", "relation": "based_in"}
			]
		}))
		.unwrap()
	}

	#[test]
	fn extraction_graph_keys_entities_by_name() {
		let g = extraction().to_graph();
		assert_eq!(g.nodes.len(), 2);
		assert_eq!(g.nodes[1].id, NodeId::from("Acme"));
		assert_eq!(g.links.len(), 2);
		assert_eq!(g.links[0].source, NodeId::from("Ada"));
		assert_eq!(g.links[0].weight, Some(2.0));
		assert_eq!(g.links[0].key.as_deref(), Some("0"));
		// unknown name stays as an id and becomes a placeholder downstream
		assert_eq!(g.links[1].target, NodeId::from("Rome"));
		assert_eq!(g.links[1].key.as_deref(), Some("3"));
	}

	#[test]
	fn numeric_names_do_not_collide_with_other_entities() {
		let x: Extraction = serde_json::from_value(json!({
			"entities": [{"name": "Ada", "type": "Person"}, {"name": "Ada", "type": "Other"}],
			"relations": [{"source": "Ada", "target": "1", "relation": "owns"}]
		}))
		.unwrap();
		let g = x.to_graph();
		assert_eq!(g.nodes.len(), 1);
		assert_eq!(g.nodes[0].node_type, "Person");
		assert_eq!(g.links[0].target, NodeId::from("1"));
		assert!(g.nodes.iter().all(|n| n.id != NodeId::from("1")));
	}

	#[test]
	fn same_entity_keeps_its_id_across_extractions() {
		let first = extraction().to_graph();
		let second: Extraction = serde_json::from_value(json!({
			"entities": [{"name": "Rome", "type": "Location"}, {"name": "Ada", "type": "Person"}]
		}))
		.unwrap();
		let second = second.to_graph();
		assert_eq!(first.nodes[0].id, second.nodes[1].id);
		assert_ne!(first.nodes[0].id, second.nodes[0].id);
	}

	#[test]
	fn related_relations_match_either_end() {
		let x = extraction();
		assert_eq!(x.relations_of("Acme").count(), 3);
		assert_eq!(x.relations_of("Rome").count(), 1);
	}

	#[test]
	fn entity_type_defaults_to_other() {
		let e: Entity = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
		assert_eq!(e.entity_type, "Other");
		assert_eq!(serde_json::to_value(&e).unwrap(), json!({"name": "x", "type": "Other"}));
	}
}
