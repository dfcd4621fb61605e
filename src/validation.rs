//! Form checks that run before any request is built.

use thiserror::Error;

use crate::api::types::{NodeBody, RelationKey, SaveRelationBody};
use crate::components::force_graph::{NodeId, Properties};

/// Input a failed check points at; pages map these to `NodeRef`s to focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
	NodeTitle,
	NodeType,
	CustomType,
	RelationSource,
	RelationTarget,
	RelationType,
	Text,
	File,
	None,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Node title is required")]
	MissingTitle,
	#[error("Node type is required")]
	MissingType,
	#[error("Node type \"{0}\" already exists")]
	DuplicateType(String),
	#[error("Choose a source node")]
	MissingSource,
	#[error("Choose a target node")]
	MissingTarget,
	#[error("Enter a relation type")]
	MissingRelationType,
	#[error("Source and target must be different nodes")]
	SameEndpoints,
	#[error("Enter some text to analyse")]
	EmptyText,
	#[error("Choose a file to upload")]
	NoFile,
	#[error("Nothing to save yet")]
	NothingToSave,
	#[error("Node id {0} has no numeric form")]
	InvalidNodeId(String),
}

impl ValidationError {
	pub fn field(&self) -> FormField {
		match self {
			ValidationError::MissingTitle => FormField::NodeTitle,
			ValidationError::MissingType => FormField::NodeType,
			ValidationError::DuplicateType(_) => FormField::CustomType,
			ValidationError::MissingSource => FormField::RelationSource,
			ValidationError::MissingTarget => FormField::RelationTarget,
			ValidationError::MissingRelationType => FormField::RelationType,
			ValidationError::SameEndpoints => FormField::RelationTarget,
			ValidationError::EmptyText => FormField::Text,
			ValidationError::NoFile => FormField::File,
			ValidationError::NothingToSave | ValidationError::InvalidNodeId(_) => FormField::None,
		}
	}
}

/// One key/value row of a property editor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyRow {
	pub key: String,
	pub value: String,
}

/// Rows with a blank key are dropped; later keys win.
pub fn collect_properties(rows: &[PropertyRow]) -> Properties {
	rows.iter()
		.filter_map(|r| {
			let key = r.key.trim();
			(!key.is_empty()).then(|| (key.to_owned(), r.value.trim().into()))
		})
		.collect()
}

/// Builds a node body. Title and type are required; a blank name takes the title.
pub fn node_body(
	title: &str,
	name: &str,
	node_type: &str,
	extra: &[PropertyRow],
) -> Result<NodeBody, ValidationError> {
	let title = title.trim();
	if title.is_empty() {
		return Err(ValidationError::MissingTitle);
	}
	let node_type = node_type.trim();
	if node_type.is_empty() {
		return Err(ValidationError::MissingType);
	}
	let name = match name.trim() {
		"" => title,
		n => n,
	};
	let mut properties = collect_properties(extra);
	properties.insert("title".into(), title.into());
	properties.insert("name".into(), name.into());
	Ok(NodeBody {
		name: name.to_owned(),
		title: title.to_owned(),
		node_type: node_type.to_owned(),
		properties,
	})
}

/// A new type name: non-blank and not already known.
pub fn custom_type(input: &str, known: &[String]) -> Result<String, ValidationError> {
	let name = input.trim();
	if name.is_empty() {
		return Err(ValidationError::MissingType);
	}
	if known.iter().any(|t| t == name) {
		return Err(ValidationError::DuplicateType(name.to_owned()));
	}
	Ok(name.to_owned())
}

fn picked(id: &Option<NodeId>) -> Option<&NodeId> {
	id.as_ref().filter(|id| !id.as_str().trim().is_empty())
}

/// Checks source, type and target in that order, then that the ends differ.
pub fn relation_key(
	source: &Option<NodeId>,
	relation_type: &str,
	target: &Option<NodeId>,
) -> Result<RelationKey, ValidationError> {
	let source = picked(source).ok_or(ValidationError::MissingSource)?;
	let relation_type = relation_type.trim();
	if relation_type.is_empty() {
		return Err(ValidationError::MissingRelationType);
	}
	let target = picked(target).ok_or(ValidationError::MissingTarget)?;
	if source == target {
		return Err(ValidationError::SameEndpoints);
	}
	Ok(RelationKey {
		source_node_id: source.clone(),
		target_node_id: target.clone(),
		relation_type: relation_type.to_owned(),
	})
}

/// Relation save body. Property rows need both a key and a value.
pub fn relation_body(
	source: &Option<NodeId>,
	relation_type: &str,
	target: &Option<NodeId>,
	rows: &[PropertyRow],
	original_type: Option<&str>,
) -> Result<SaveRelationBody, ValidationError> {
	let key = relation_key(source, relation_type, target)?;
	let filled: Vec<PropertyRow> = rows
		.iter()
		.filter(|r| !r.value.trim().is_empty())
		.cloned()
		.collect();
	Ok(SaveRelationBody {
		source_node_id: key.source_node_id,
		target_node_id: key.target_node_id,
		relation_type: key.relation_type,
		properties: collect_properties(&filled),
		original_type: original_type.map(str::to_owned),
	})
}

pub fn extraction_text(text: &str) -> Result<&str, ValidationError> {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		Err(ValidationError::EmptyText)
	} else {
		Ok(trimmed)
	}
}

/// Numeric id for the subgraph endpoint.
pub fn subgraph_id(id: &NodeId) -> Result<i64, ValidationError> {
	id.numeric()
		.ok_or_else(|| ValidationError::InvalidNodeId(id.to_string()))
}

#[cfg(test)]
mod tests {
	use serde_json::Value;

	use super::*;

	fn row(k: &str, v: &str) -> PropertyRow {
		PropertyRow {
			key: k.into(),
			value: v.into(),
		}
	}

	#[test]
	fn node_title_and_type_are_required() {
		assert_eq!(node_body(" ", "x", "Paper", &[]), Err(ValidationError::MissingTitle));
		assert_eq!(node_body("T", "x", "", &[]), Err(ValidationError::MissingType));
		assert_eq!(ValidationError::MissingTitle.field(), FormField::NodeTitle);
	}

	#[test]
	fn blank_name_falls_back_to_title() {
		let body = node_body("Graph Theory", "", "Topic", &[row("year", "1736"), row(" ", "lost")]).unwrap();
		assert_eq!(body.name, "Graph Theory");
		assert_eq!(body.properties["name"], Value::from("Graph Theory"));
		assert_eq!(body.properties["year"], Value::from("1736"));
		assert_eq!(body.properties.len(), 3);
	}

	#[test]
	fn custom_type_rejects_blank_and_known() {
		let known = vec!["Paper".to_owned()];
		assert_eq!(custom_type("  ", &known), Err(ValidationError::MissingType));
		assert_eq!(
			custom_type("Paper", &known),
			Err(ValidationError::DuplicateType("Paper".into()))
		);
		assert_eq!(custom_type(" Dataset ", &known), Ok("Dataset".into()));
	}

	#[test]
	fn relation_checks_run_in_order() {
		let a = Some(NodeId::from("1"));
		let b = Some(NodeId::from("2"));
		assert_eq!(relation_key(&None, "", &None), Err(ValidationError::MissingSource));
		assert_eq!(relation_key(&a, " ", &None), Err(ValidationError::MissingRelationType));
		assert_eq!(relation_key(&a, "CITES", &None), Err(ValidationError::MissingTarget));
		assert_eq!(relation_key(&a, "CITES", &a), Err(ValidationError::SameEndpoints));
		assert_eq!(relation_key(&a, "CITES", &b).unwrap().relation_type, "CITES");
		assert_eq!(relation_key(&Some(NodeId::from(" ")), "x", &b), Err(ValidationError::MissingSource));
	}

	#[test]
	fn relation_rows_need_key_and_value() {
		let a = Some(NodeId::from("1"));
		let b = Some(NodeId::from("2"));
		let body = relation_body(&a, "CITES", &b, &[row("since", "2001"), row("note", "")], Some("REFS")).unwrap();
		assert_eq!(body.properties.len(), 1);
		assert_eq!(body.original_type.as_deref(), Some("REFS"));
	}

	#[test]
	fn text_and_ids() {
		assert_eq!(extraction_text("  \n"), Err(ValidationError::EmptyText));
		assert_eq!(extraction_text(" hi "), Ok("hi"));
		assert_eq!(subgraph_id(&NodeId::from("4:ab:9")), Ok(9));
		assert!(matches!(subgraph_id(&NodeId::from("abc")), Err(ValidationError::InvalidNodeId(_))));
	}
}
