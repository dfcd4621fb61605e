use leptos::html::Input;
use leptos::prelude::*;
use log::debug;
use wasm_bindgen_futures::spawn_local;

use crate::api::types::{RelationKey, RelationPage, RelationRow, SearchHit};
use crate::api::{ApiClient, RelationQuery, RequestError, RequestSequencer};
use crate::components::force_graph::NodeId;
use crate::components::pagination::Pagination;
use crate::components::property_editor::{PropertyEditor, PropertyFields};
use crate::components::toast::use_notifications;
use super::claim;
use crate::validation::{FormField, relation_body};

/// One endpoint of the relation being edited: the typed name and the picked node.
#[derive(Clone, Copy)]
struct Endpoint {
	name: RwSignal<String>,
	id: RwSignal<Option<NodeId>>,
	input: NodeRef<Input>,
}

impl Endpoint {
	fn new() -> Self {
		Self {
			name: RwSignal::new(String::new()),
			id: RwSignal::new(None),
			input: NodeRef::new(),
		}
	}

	fn set(&self, id: Option<NodeId>, name: String) {
		self.id.set(id);
		self.name.set(name);
	}

	/// Name for the triple preview; unpicked text is shown with a marker.
	fn preview(&self, placeholder: &str) -> (String, bool) {
		let name = self.name.get();
		let picked = self.id.read().is_some();
		match name.trim() {
			"" => (placeholder.to_owned(), true),
			n => (n.to_owned(), picked),
		}
	}

	fn focus(&self) {
		if let Some(Err(err)) = self.input.get().map(|el| el.focus()) {
			debug!("focus failed: {err:?}");
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
enum Editor {
	Closed,
	Add,
	/// Editing the relation of this type between the picked endpoints.
	Edit(String),
}

fn key_of(row: &RelationRow) -> RelationKey {
	RelationKey {
		source_node_id: row.source_id.clone(),
		target_node_id: row.target_id.clone(),
		relation_type: row.relation_type.clone(),
	}
}

/// Name input with a search button and a result list for picking a node.
#[component]
fn NodePicker(label: &'static str, endpoint: Endpoint) -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let toasts = use_notifications();
	let results = RwSignal::new(None::<Vec<SearchHit>>);
	let searching = RwSignal::new(false);

	let search = Callback::new(move |_: ()| {
		let text = endpoint.name.get_untracked();
		if text.trim().is_empty() {
			toasts.info(format!("Enter a {} node name", label.to_lowercase()));
			return;
		}
		let api = api.clone();
		searching.set(true);
		spawn_local(async move {
			let result = api.search_nodes(&text).await;
			searching.set(false);
			match result {
				Ok(found) => results.set(Some(found.nodes)),
				Err(err) => {
					results.set(None);
					toasts.error(format!("Node search failed: {err}"));
				}
			}
		});
	});

	view! {
		<div class="node-picker">
			<label>{label}</label>
			<div class="input-group">
				<input
					node_ref=endpoint.input
					type="text"
					placeholder="Search by name"
					class:has-id=move || endpoint.id.read().is_some()
					prop:value=endpoint.name
					on:input=move |ev| {
						endpoint.name.set(event_target_value(&ev));
						endpoint.id.set(None);
					}
					on:keyup=move |ev| {
						if ev.key() == "Enter" {
							search.run(());
						}
					}
				/>
				<button class="btn" disabled=move || searching.get() on:click=move |_| search.run(())>
					{move || if searching.get() { "..." } else { "Search" }}
				</button>
			</div>
			{move || {
				results
					.get()
					.map(|hits| {
						if hits.is_empty() {
							return view! { <div class="search-results empty">"No matching nodes"</div> }.into_any();
						}
						view! {
							<ul class="search-results">
								{hits
									.into_iter()
									.map(|hit| {
										let label = hit.label();
										let picked = hit.clone();
										view! {
											<li on:click=move |_| {
												let name = picked
													.title
													.clone()
													.or_else(|| picked.name.clone())
													.unwrap_or_else(|| picked.id.to_string());
												endpoint.set(Some(picked.id.clone()), name);
												results.set(None);
											}>{label}</li>
										}
									})
									.collect_view()}
							</ul>
						}
							.into_any()
					})
			}}
		</div>
	}
}

/// Paginated relation list with create, edit and delete by endpoint ids.
#[component]
pub fn RelationsPage() -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let toasts = use_notifications();
	let sequencer = RequestSequencer::new();

	let filter = RwSignal::new(RelationQuery::default());
	let page = RwSignal::new(1u32);
	let listing = RwSignal::new(None::<RelationPage>);
	let list_error = RwSignal::new(None::<String>);
	let relation_types = RwSignal::new(Vec::<String>::new());
	let editor = RwSignal::new(Editor::Closed);
	let deleting = RwSignal::new(None::<RelationRow>);
	let saving = RwSignal::new(false);
	let deleting_busy = RwSignal::new(false);

	let source = Endpoint::new();
	let target = Endpoint::new();
	let relation_type = RwSignal::new(String::new());
	let type_ref = NodeRef::<Input>::new();
	let props = PropertyFields::new();

	let load_types = Callback::new({
		let api = api.clone();
		move |_: ()| {
			let api = api.clone();
			spawn_local(async move {
				match api.relation_types().await {
					Ok(list) => relation_types.set(list.into_types()),
					Err(err) => toasts.error(format!("Failed to load relation types: {err}")),
				}
			});
		}
	});

	let load_page = Callback::new({
		let (api, sequencer) = (api.clone(), sequencer.clone());
		move |target_page: u32| {
			let token = sequencer.issue();
			let query = RelationQuery {
				page: target_page,
				..filter.get_untracked()
			};
			let (api, sequencer) = (api.clone(), sequencer.clone());
			listing.set(None);
			list_error.set(None);
			spawn_local(async move {
				let result = api.relations(&query).await;
				if !sequencer.is_current(token) {
					debug!("discarding stale relation page {token}");
					return;
				}
				match result {
					Ok(p) => {
						page.set(target_page.max(1));
						listing.set(Some(p));
					}
					Err(err) => {
						list_error.set(Some(err.to_string()));
						toasts.error(format!("Failed to load relations: {err}"));
					}
				}
			});
		}
	});

	load_types.run(());
	load_page.run(1);

	let open_add = move |_: web_sys::MouseEvent| {
		source.set(None, String::new());
		target.set(None, String::new());
		relation_type.set(String::new());
		props.clear();
		editor.set(Editor::Add);
	};

	let open_edit = Callback::new({
		let api = api.clone();
		move |row: RelationRow| {
			source.set(Some(row.source_id.clone()), row.source_name.clone().unwrap_or_default());
			target.set(Some(row.target_id.clone()), row.target_name.clone().unwrap_or_default());
			relation_type.set(row.relation_type.clone());
			props.clear();
			editor.set(Editor::Edit(row.relation_type.clone()));
			let api = api.clone();
			let key = key_of(&row);
			spawn_local(async move {
				match api.relation_properties(&key).await {
					Ok(found) => props.fill(&found.properties, &[]),
					Err(RequestError::Rejected(msg)) => toasts.info(msg),
					Err(err) => toasts.error(format!("Failed to load relation properties: {err}")),
				}
			});
		}
	});

	let focus = move |field: FormField| match field {
		FormField::RelationSource => source.focus(),
		FormField::RelationTarget => target.focus(),
		FormField::RelationType => {
			if let Some(Err(err)) = type_ref.get().map(|el| el.focus()) {
				debug!("focus failed: {err:?}");
			}
		}
		_ => {}
	};

	let save = Callback::new({
		let api = api.clone();
		move |()| {
			let original = match editor.get_untracked() {
				Editor::Edit(t) => Some(t),
				_ => None,
			};
			let body = match relation_body(
				&source.id.get_untracked(),
				&relation_type.get_untracked(),
				&target.id.get_untracked(),
				&props.snapshot(),
				original.as_deref(),
			) {
				Ok(body) => body,
				Err(err) => {
					toasts.error(err.to_string());
					focus(err.field());
					return;
				}
			};
			let api = api.clone();
			saving.set(true);
			spawn_local(async move {
				let result = api.save_relation(&body).await;
				saving.set(false);
				match result {
					Ok(ack) => {
						toasts.success(ack.message.unwrap_or_else(|| "Relation saved".into()));
						editor.set(Editor::Closed);
						load_page.run(page.get_untracked());
						load_types.run(());
					}
					Err(err) => toasts.error(format!("Failed to save relation: {err}")),
				}
			});
		}
	});

	let confirm_delete = Callback::new({
		let api = api.clone();
		move |()| {
			let Some(row) = deleting.get_untracked() else {
				return;
			};
			if !claim(deleting_busy) {
				return;
			}
			let api = api.clone();
			spawn_local(async move {
				let result = api.delete_relation(&key_of(&row)).await;
				deleting_busy.set(false);
				match result {
					Ok(ack) => {
						toasts.success(ack.message.unwrap_or_else(|| "Relation deleted".into()));
						deleting.set(None);
						load_page.run(page.get_untracked());
					}
					Err(err) => toasts.error(format!("Failed to delete relation: {err}")),
				}
			});
		}
	});

	let triple = move || {
		let (s, s_ok) = source.preview("Source");
		let (t, t_ok) = target.preview("Target");
		let r = match relation_type.get().trim() {
			"" => "Relation".to_owned(),
			r => r.to_owned(),
		};
		view! {
			<div class="triple">
				<span class="triple-node" class:validation-warning={!s_ok}>{s}</span>
				<span class="triple-edge">{format!("-[{r}]->")}</span>
				<span class="triple-node" class:validation-warning={!t_ok}>{t}</span>
			</div>
		}
	};

	view! {
		<section class="admin-page relations-page">
			<header class="page-header">
				<h1>"Relations"</h1>
				<button class="btn primary" on:click=open_add>
					"Add relation"
				</button>
			</header>

			<div class="filters">
				<input
					type="text"
					placeholder="Source name"
					prop:value=move || filter.read().source.clone()
					on:input=move |ev| filter.update(|f| f.source = event_target_value(&ev))
				/>
				<select
					prop:value=move || filter.read().relation_type.clone()
					on:change=move |ev| filter.update(|f| f.relation_type = event_target_value(&ev))
				>
					<option value="">"All relations"</option>
					<For each=move || relation_types.get() key=|t| t.clone() let:t>
						<option value=t.clone()>{t.clone()}</option>
					</For>
				</select>
				<input
					type="text"
					placeholder="Target name"
					prop:value=move || filter.read().target.clone()
					on:input=move |ev| filter.update(|f| f.target = event_target_value(&ev))
				/>
				<button class="btn" on:click=move |_| load_page.run(1)>
					"Search"
				</button>
			</div>

			<table class="admin-table">
				<thead>
					<tr>
						<th>"Source"</th>
						<th>"Relation"</th>
						<th>"Target"</th>
						<th>"Actions"</th>
					</tr>
				</thead>
				<tbody>
					{move || match (listing.get(), list_error.get()) {
						(_, Some(err)) => {
							view! {
								<tr>
									<td colspan="4" class="table-error">{format!("Failed to load: {err}")}</td>
								</tr>
							}
								.into_any()
						}
						(None, None) => {
							view! {
								<tr>
									<td colspan="4" class="table-loading">
										<div class="spinner"></div>
									</td>
								</tr>
							}
								.into_any()
						}
						(Some(p), None) if p.relations.is_empty() => {
							view! {
								<tr>
									<td colspan="4" class="table-empty">"No relations match these filters"</td>
								</tr>
							}
								.into_any()
						}
						(Some(p), None) => {
							p.relations
								.into_iter()
								.map(|row| {
									let (edit_row, del_row) = (row.clone(), row.clone());
									view! {
										<tr>
											<td>{row.source_label()}</td>
											<td>
												<span class="badge">{row.relation_type.clone()}</span>
											</td>
											<td>{row.target_label()}</td>
											<td class="actions">
												<button
													class="btn small"
													title="Edit relation"
													on:click=move |_| open_edit.run(edit_row.clone())
												>
													"Edit"
												</button>
												<button
													class="btn small danger"
													title="Delete relation"
													on:click=move |_| deleting.set(Some(del_row.clone()))
												>
													"Delete"
												</button>
											</td>
										</tr>
									}
								})
								.collect_view()
								.into_any()
						}
					}}
				</tbody>
			</table>

			<Pagination
				current=page
				total=Signal::derive(move || listing.read().as_ref().map(|p| p.pages).unwrap_or(1))
				on_page={move |p: u32| load_page.run(p)}
			/>

			<Show when=move || editor.get() != Editor::Closed>
				<div class="modal-backdrop">
					<div class="modal">
						<header class="modal-header">
							<h2>
								{move || if matches!(*editor.read(), Editor::Edit(_)) { "Edit relation" } else { "Add relation" }}
							</h2>
							<button class="close" aria-label="Close" on:click=move |_| editor.set(Editor::Closed)>
								"×"
							</button>
						</header>
						<div class="modal-body">
							{triple}
							<NodePicker label="Source" endpoint=source />
							<label>"Relation type"</label>
							<input
								node_ref=type_ref
								type="text"
								list="relation-type-options"
								prop:value=relation_type
								on:input=move |ev| relation_type.set(event_target_value(&ev))
							/>
							<datalist id="relation-type-options">
								<For each=move || relation_types.get() key=|t| t.clone() let:t>
									<option value=t.clone()></option>
								</For>
							</datalist>
							<NodePicker label="Target" endpoint=target />
							<label>"Properties"</label>
							<PropertyEditor fields=props />
						</div>
						<footer class="modal-footer">
							<button class="btn" on:click=move |_| editor.set(Editor::Closed)>
								"Cancel"
							</button>
							<button class="btn primary" disabled=move || saving.get() on:click=move |_| save.run(())>
								{move || if saving.get() { "Saving..." } else { "Save" }}
							</button>
						</footer>
					</div>
				</div>
			</Show>

			<Show when=move || deleting.read().is_some()>
				<div class="modal-backdrop">
					<div class="modal small">
						<h2>"Delete relation"</h2>
						<p>
							{move || {
								deleting
									.get()
									.map(|row| {
										format!("{} -[{}]-> {}", row.source_label(), row.relation_type, row.target_label())
									})
							}}
						</p>
						<footer class="modal-footer">
							<button class="btn" on:click=move |_| deleting.set(None)>
								"Cancel"
							</button>
							<button
								class="btn danger"
								disabled=move || deleting_busy.get()
								on:click=move |_| confirm_delete.run(())
							>
								{move || if deleting_busy.get() { "Deleting..." } else { "Delete" }}
							</button>
						</footer>
					</div>
				</div>
			</Show>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn row_key_uses_ids_and_type() {
		let row: RelationRow = serde_json::from_value(serde_json::json!({
			"source_id": 3, "source_name": "Ada", "type": "WROTE", "target_id": "4:x:9"
		}))
		.unwrap();
		let key = key_of(&row);
		assert_eq!(key.source_node_id, NodeId::from("3"));
		assert_eq!(key.target_node_id, NodeId::from("4:x:9"));
		assert_eq!(key.relation_type, "WROTE");
	}
}
