use leptos::prelude::*;
use serde_json::Value;

use crate::components::force_graph::Properties;
use crate::validation::PropertyRow;

/// One editable key/value row.
#[derive(Clone, Copy, Debug)]
pub struct PropertyField {
	id: u64,
	pub key: RwSignal<String>,
	pub value: RwSignal<String>,
}

/// Property rows being edited, plus the id counter for new rows.
#[derive(Clone, Copy)]
pub struct PropertyFields {
	rows: RwSignal<Vec<PropertyField>>,
	next_id: StoredValue<u64>,
}

impl Default for PropertyFields {
	fn default() -> Self {
		Self::new()
	}
}

/// Editable text for a property value; strings lose their quotes.
pub fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

impl PropertyFields {
	pub fn new() -> Self {
		Self {
			rows: RwSignal::new(Vec::new()),
			next_id: StoredValue::new(0),
		}
	}

	fn field(&self, key: String, value: String) -> PropertyField {
		let id = self.next_id.get_value() + 1;
		self.next_id.set_value(id);
		PropertyField {
			id,
			key: RwSignal::new(key),
			value: RwSignal::new(value),
		}
	}

	pub fn push(&self, key: impl Into<String>, value: impl Into<String>) {
		let field = self.field(key.into(), value.into());
		self.rows.update(|rows| rows.push(field));
	}

	pub fn remove(&self, id: u64) {
		self.rows.update(|rows| rows.retain(|r| r.id != id));
	}

	/// Replaces all rows with `props`, minus the `skip` keys.
	pub fn fill(&self, props: &Properties, skip: &[&str]) {
		let fields: Vec<PropertyField> = props
			.iter()
			.filter(|(k, _)| !skip.contains(&k.as_str()))
			.map(|(k, v)| self.field(k.clone(), value_text(v)))
			.collect();
		self.rows.set(fields);
	}

	pub fn clear(&self) {
		self.rows.set(Vec::new());
	}

	pub fn snapshot(&self) -> Vec<PropertyRow> {
		self.rows
			.get_untracked()
			.iter()
			.map(|f| PropertyRow {
				key: f.key.get_untracked(),
				value: f.value.get_untracked(),
			})
			.collect()
	}
}

#[component]
pub fn PropertyEditor(
	fields: PropertyFields,
	#[prop(into, default = Signal::stored(false))] readonly: Signal<bool>,
) -> impl IntoView {
	view! {
		<div class="property-editor">
			<For each=move || fields.rows.get() key=|f| f.id let:field>
				<div class="property-field">
					<input
						class="property-key"
						type="text"
						placeholder="Key"
						prop:value=field.key
						prop:readonly=readonly
						on:input=move |ev| field.key.set(event_target_value(&ev))
					/>
					<input
						class="property-value"
						type="text"
						placeholder="Value"
						prop:value=field.value
						prop:readonly=readonly
						on:input=move |ev| field.value.set(event_target_value(&ev))
					/>
					<Show when=move || !readonly.get()>
						<button class="btn danger" title="Remove property" on:click=move |_| fields.remove(field.id)>
							"×"
						</button>
					</Show>
				</div>
			</For>
			<Show when=move || !readonly.get()>
				<button class="btn" on:click=move |_| fields.push("", "")>
					"Add property"
				</button>
			</Show>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn values_are_edited_as_plain_text() {
		assert_eq!(value_text(&json!("MIT")), "MIT");
		assert_eq!(value_text(&json!(1843)), "1843");
		assert_eq!(value_text(&json!(null)), "");
		assert_eq!(value_text(&json!(true)), "true");
	}
}
