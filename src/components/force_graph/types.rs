use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Node identity. The API sends element-id strings on some endpoints and integers on others.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Integer form used by the subgraph endpoint: the whole id, or the trailing
	/// segment of a `db:uuid:n` element id.
	pub fn numeric(&self) -> Option<i64> {
		let raw = self.0.trim();
		raw.parse()
			.ok()
			.or_else(|| raw.rsplit(':').next().and_then(|tail| tail.parse().ok()))
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

impl<'de> Deserialize<'de> for NodeId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Text(String),
			Int(i64),
			Float(f64),
		}
		Ok(match Raw::deserialize(deserializer)? {
			Raw::Text(s) => NodeId(s),
			Raw::Int(i) => NodeId(i.to_string()),
			Raw::Float(f) => NodeId(f.to_string()),
		})
	}
}

pub type Properties = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: NodeId,
	pub name: String,
	pub node_type: String,
	pub properties: Properties,
}

impl GraphNode {
	/// A string property, if present and non-empty.
	pub fn property_str(&self, key: &str) -> Option<&str> {
		self.properties
			.get(key)
			.and_then(Value::as_str)
			.filter(|s| !s.is_empty())
	}

	/// External link opened on double-click instead of expanding the subgraph.
	pub fn external_link(&self) -> Option<&str> {
		self.property_str("url").filter(|u| u.starts_with("http"))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: NodeId,
	pub target: NodeId,
	pub relation: String,
	pub weight: Option<f64>,
	/// Overrides the `source|relation|target` key when set.
	pub key: Option<String>,
}

impl GraphLink {
	pub fn new(source: impl Into<String>, target: impl Into<String>, relation: impl Into<String>) -> Self {
		Self {
			source: NodeId::new(source),
			target: NodeId::new(target),
			relation: relation.into(),
			weight: None,
			key: None,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
	/// Node to pin at the viewport center for a while after loading.
	pub focus: Option<NodeId>,
}

/// Imperative requests from a page to its canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphCommand {
	/// Zoom around the viewport center.
	ZoomBy(f64),
	/// Fit all nodes into the viewport.
	ResetZoom,
	ClearSelection,
}
