use leptos::prelude::*;
use serde_json::Value;

use crate::components::force_graph::{GraphNode, StyleTable};

/// How a property value is shown in the details panel.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
	Text(String),
	Link { href: String, text: String },
	Mail { href: String, text: String },
}

/// Only web addresses become links; any other scheme stays text.
fn looks_like_url(value: &str) -> bool {
	let lower = value.trim_start().to_ascii_lowercase();
	lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
}

fn display_value(key: &str, value: &Value) -> Option<PropertyValue> {
	let text = match value {
		Value::Null => return None,
		Value::String(s) if s.is_empty() => return None,
		Value::String(s) => s.clone(),
		other => return Some(PropertyValue::Text(other.to_string())),
	};
	Some(if looks_like_url(&text) {
		let href = if text.trim_start().to_ascii_lowercase().starts_with("www.") {
			format!("http://{text}")
		} else {
			text.clone()
		};
		PropertyValue::Link { href, text }
	} else if key.to_lowercase().contains("email") {
		PropertyValue::Mail {
			href: format!("mailto:{text}"),
			text,
		}
	} else {
		PropertyValue::Text(text)
	})
}

/// Displayable properties of `node`, minus `name`, `type` and empty values.
pub fn property_rows(node: &GraphNode) -> Vec<(String, PropertyValue)> {
	node.properties
		.iter()
		.filter(|(k, _)| k.as_str() != "name" && k.as_str() != "type")
		.filter_map(|(k, v)| display_value(k, v).map(|pv| (k.clone(), pv)))
		.collect()
}

/// Side panel for the selected node.
#[component]
pub fn NodeDetails(
	#[prop(into)] node: Signal<Option<GraphNode>>,
	#[prop(default = StyleTable::EXPLORER)] styles: StyleTable,
	#[prop(into)] on_close: Callback<()>,
	/// Extra content under the property list.
	#[prop(optional)]
	children: Option<ChildrenFn>,
) -> impl IntoView {
	move || {
		node.get().map(|n| {
			let badge = format!("background-color: {}", styles.color(&n.node_type));
			let node_type = if n.node_type.is_empty() { "Unknown".to_owned() } else { n.node_type.clone() };
			let name = if n.name.is_empty() { "Unnamed".to_owned() } else { n.name.clone() };
			let rows = property_rows(&n);
			let extra = children.clone();
			view! {
				<aside class="node-info">
					<header class="node-info-header">
						<h3>"Node details"</h3>
						<button class="close" aria-label="Close" on:click=move |_| on_close.run(())>
							"×"
						</button>
					</header>
					<div class="node-field">
						<strong>"Type: "</strong>
						<span class="badge" style=badge>{node_type}</span>
					</div>
					<div class="node-field">
						<strong>"Name: "</strong>
						{name}
					</div>
					<ul class="node-props">
						{rows
							.into_iter()
							.map(|(key, value)| {
								let value = match value {
									PropertyValue::Text(t) => view! { <span>{t}</span> }.into_any(),
									PropertyValue::Link { href, text } => {
										view! {
											<a href=href target="_blank" rel="noopener">
												{text}
											</a>
										}
											.into_any()
									}
									PropertyValue::Mail { href, text } => view! { <a href=href>{text}</a> }.into_any(),
								};
								view! {
									<li>
										<span class="prop-key">{key}</span>
										<span class="prop-value">{value}</span>
									</li>
								}
							})
							.collect_view()}
					</ul>
					{extra.map(|c| c())}
				</aside>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::force_graph::{NodeId, Properties};

	fn node(props: Value) -> GraphNode {
		let properties: Properties = serde_json::from_value(props).unwrap();
		GraphNode {
			id: NodeId::from("1"),
			name: "Ada".into(),
			node_type: "Professor".into(),
			properties,
		}
	}

	#[test]
	fn links_are_detected_by_value() {
		assert!(looks_like_url("https://a.org"));
		assert!(looks_like_url("HTTP://A.ORG"));
		assert!(!looks_like_url("example.org"));
		assert!(!looks_like_url("plain"));
		assert_eq!(
			display_value("site", &json!("www.a.org")),
			Some(PropertyValue::Link {
				href: "http://www.a.org".into(),
				text: "www.a.org".into()
			})
		);
	}

	#[test]
	fn script_urls_render_as_text() {
		let script = "javascript:alert(document.cookie)";
		assert_eq!(display_value("url", &json!(script)), Some(PropertyValue::Text(script.into())));
		assert_eq!(
			display_value("homepage", &json!("data:text/html,<b>x</b>")),
			Some(PropertyValue::Text("data:text/html,<b>x</b>".into()))
		);
	}

	#[test]
	fn email_keys_become_mailto() {
		assert_eq!(
			display_value("Email", &json!("ada@uni.edu")),
			Some(PropertyValue::Mail {
				href: "mailto:ada@uni.edu".into(),
				text: "ada@uni.edu".into()
			})
		);
	}

	#[test]
	fn name_type_and_empty_values_are_skipped() {
		let rows = property_rows(&node(json!({
			"name": "Ada", "type": "Professor", "bio": "", "h": null, "year": 1843, "field": "math"
		})));
		let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
		assert_eq!(keys, vec!["field", "year"]);
		assert_eq!(rows[1].1, PropertyValue::Text("1843".into()));
	}
}
