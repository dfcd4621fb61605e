//! HTTP access to the knowledge-graph API.

mod client;
mod error;
pub mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use client::{ApiClient, Method, RetryPolicy};
pub use error::RequestError;
use web_sys::FormData;

use crate::components::force_graph::{GraphData, NodeId};
use types::{
	Ack, Extraction, GraphPayload, NodeBody, NodePage, RelationKey, RelationPage, RelationProperties,
	SaveRelationBody, SearchResults, Stats, TypeList,
};

/// Issues increasing tokens; only the newest token's response may be applied.
#[derive(Clone, Debug, Default)]
pub struct RequestSequencer {
	latest: Arc<AtomicU64>,
}

impl RequestSequencer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn issue(&self) -> u64 {
		self.latest.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn is_current(&self, token: u64) -> bool {
		self.latest.load(Ordering::SeqCst) == token
	}
}

/// Filters for one admin list page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeQuery {
	pub page: u32,
	pub name: String,
	pub node_type: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationQuery {
	pub page: u32,
	pub source: String,
	pub relation_type: String,
	pub target: String,
}

pub const PAGE_SIZE: u32 = 10;

const NODE_TYPES: &str = "/api/node_types";
const RELATION_TYPES: &str = "/api/relation-types";

fn push_non_empty(query: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
	let value = value.trim();
	if !value.is_empty() {
		query.push((key, value.to_owned()));
	}
}

impl ApiClient {
	pub async fn graph(&self, limit: u32, search: &str, relation: &str) -> Result<GraphData, RequestError> {
		let mut query = vec![("limit", limit.to_string())];
		push_non_empty(&mut query, "search", search);
		push_non_empty(&mut query, "relation", relation);
		let payload: GraphPayload = self.get_json("/api/graph", &query).await?;
		Ok(payload.into())
	}

	/// Neighborhood of `node`, with `node` requested as the focus.
	pub async fn subgraph(&self, node: &NodeId, numeric: i64, limit: u32) -> Result<GraphData, RequestError> {
		let query = [("depth", "1".to_owned()), ("limit", limit.to_string())];
		let payload: GraphPayload = self
			.get_json(&format!("/api/graph/subgraph/{numeric}"), &query)
			.await?;
		let mut data = GraphData::from(payload);
		data.focus = data
			.nodes
			.iter()
			.find(|n| &n.id == node || n.id.numeric() == Some(numeric))
			.map(|n| n.id.clone());
		Ok(data)
	}

	pub async fn relation_types(&self) -> Result<TypeList, RequestError> {
		self.get_json(RELATION_TYPES, &[]).await
	}

	pub async fn node_types(&self) -> Result<TypeList, RequestError> {
		self.get_json(NODE_TYPES, &[]).await
	}

	/// Type lists for the statistics page, retried like the counts.
	pub async fn relation_types_with_retry(&self) -> Result<TypeList, RequestError> {
		self.get_json_with_retry(RELATION_TYPES, &[], RetryPolicy::default())
			.await
	}

	pub async fn node_types_with_retry(&self) -> Result<TypeList, RequestError> {
		self.get_json_with_retry(NODE_TYPES, &[], RetryPolicy::default())
			.await
	}

	pub async fn stats(&self) -> Result<Stats, RequestError> {
		self.get_json_with_retry("/api/stats", &[], RetryPolicy::default())
			.await
	}

	pub async fn nodes(&self, q: &NodeQuery, limit: u32) -> Result<NodePage, RequestError> {
		let mut query = vec![("page", q.page.max(1).to_string()), ("limit", limit.to_string())];
		push_non_empty(&mut query, "name", &q.name);
		push_non_empty(&mut query, "type", &q.node_type);
		self.get_json("/api/admin/nodes", &query).await
	}

	pub async fn node(&self, id: &NodeId) -> Result<types::AdminNode, RequestError> {
		self.get_json(&format!("/api/admin/nodes/{id}"), &[]).await
	}

	/// Creates a node, or updates `id` when given.
	pub async fn save_node(&self, id: Option<&NodeId>, body: &NodeBody) -> Result<Ack, RequestError> {
		match id {
			Some(id) => {
				self.send_json(Method::Put, &format!("/api/admin/nodes/{id}"), body)
					.await
			}
			None => self.send_json(Method::Post, "/api/admin/nodes", body).await,
		}
	}

	pub async fn delete_node(&self, id: &NodeId) -> Result<Ack, RequestError> {
		self.delete_json(&format!("/api/admin/nodes/{id}")).await
	}

	pub async fn relations(&self, q: &RelationQuery) -> Result<RelationPage, RequestError> {
		let mut query = vec![("page", q.page.max(1).to_string()), ("limit", PAGE_SIZE.to_string())];
		push_non_empty(&mut query, "source", &q.source);
		push_non_empty(&mut query, "type", &q.relation_type);
		push_non_empty(&mut query, "target", &q.target);
		self.get_json("/api/admin/relations", &query).await
	}

	pub async fn save_relation(&self, body: &SaveRelationBody) -> Result<Ack, RequestError> {
		self.send_json(Method::Post, "/api/admin/relations/save-by-nodes", body)
			.await
	}

	pub async fn delete_relation(&self, key: &RelationKey) -> Result<Ack, RequestError> {
		self.send_json(Method::Post, "/api/admin/relations/delete-by-nodes", key)
			.await
	}

	pub async fn relation_properties(&self, key: &RelationKey) -> Result<RelationProperties, RequestError> {
		self.send_json(Method::Post, "/api/admin/relations/properties-by-nodes", key)
			.await
	}

	pub async fn search_nodes(&self, text: &str) -> Result<SearchResults, RequestError> {
		let query = [("query", text.trim().to_owned()), ("limit", PAGE_SIZE.to_string())];
		self.get_json("/api/search/nodes", &query).await
	}

	pub async fn upload(&self, form: FormData) -> Result<Extraction, RequestError> {
		self.post_form("/upload", form).await
	}

	pub async fn process_text(&self, text: &str) -> Result<Extraction, RequestError> {
		#[derive(serde::Serialize)]
		struct Body<'a> {
			text: &'a str,
		}
		self.send_json(Method::Post, "/process_text", &Body { text }).await
	}

	pub async fn save_extraction(&self, extraction: &Extraction) -> Result<Ack, RequestError> {
		self.send_json(Method::Post, "/save_to_neo4j", extraction).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_the_newest_token_is_current() {
		let seq = RequestSequencer::new();
		let first = seq.issue();
		let second = seq.issue();
		assert!(second > first);
		assert!(!seq.is_current(first));
		assert!(seq.is_current(second));
	}

	#[test]
	fn clones_share_one_counter() {
		let seq = RequestSequencer::new();
		let other = seq.clone();
		let token = seq.issue();
		other.issue();
		assert!(!seq.is_current(token));
	}

	#[test]
	fn blank_filters_are_omitted() {
		let mut q = Vec::new();
		push_non_empty(&mut q, "name", "  ");
		push_non_empty(&mut q, "type", " Paper ");
		assert_eq!(q, vec![("type", "Paper".to_owned())]);
	}
}
