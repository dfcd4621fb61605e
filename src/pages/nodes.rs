use leptos::html::{Input, Select};
use leptos::prelude::*;
use log::debug;
use wasm_bindgen_futures::spawn_local;

use crate::api::types::{AdminNode, NodePage, TypeCount};
use crate::api::{ApiClient, NodeQuery, PAGE_SIZE, RequestSequencer};
use crate::components::force_graph::NodeId;
use crate::components::pagination::Pagination;
use crate::components::property_editor::{PropertyEditor, PropertyFields, value_text};
use crate::components::toast::use_notifications;
use super::claim;
use crate::validation::{FormField, custom_type, node_body};

/// Select value that opens the custom type input.
const CUSTOM_TYPE: &str = "__custom__";

#[derive(Clone, Debug, PartialEq)]
enum Editor {
	Closed,
	Add,
	View(NodeId),
	Edit(NodeId),
}

impl Editor {
	fn title(&self) -> &'static str {
		match self {
			Editor::Closed => "",
			Editor::Add => "Add node",
			Editor::View(_) => "Node details",
			Editor::Edit(_) => "Edit node",
		}
	}

	fn readonly(&self) -> bool {
		matches!(self, Editor::View(_))
	}

	fn target(&self) -> Option<&NodeId> {
		match self {
			Editor::Edit(id) => Some(id),
			_ => None,
		}
	}
}

/// Text shown for a type option: `name (count)` when counts are known.
fn type_option_label(item: &TypeCount) -> String {
	format!("{} ({})", item.type_name, item.count)
}

/// Node form fields.
#[derive(Clone, Copy)]
struct NodeForm {
	title: RwSignal<String>,
	name: RwSignal<String>,
	node_type: RwSignal<String>,
	custom: RwSignal<Option<String>>,
	props: PropertyFields,
	title_ref: NodeRef<Input>,
	type_ref: NodeRef<Select>,
	custom_ref: NodeRef<Input>,
}

impl NodeForm {
	fn new() -> Self {
		Self {
			title: RwSignal::new(String::new()),
			name: RwSignal::new(String::new()),
			node_type: RwSignal::new(String::new()),
			custom: RwSignal::new(None),
			props: PropertyFields::new(),
			title_ref: NodeRef::new(),
			type_ref: NodeRef::new(),
			custom_ref: NodeRef::new(),
		}
	}

	fn reset(&self, default_type: Option<String>) {
		self.title.set(String::new());
		self.name.set(String::new());
		self.node_type.set(default_type.unwrap_or_default());
		self.custom.set(None);
		self.props.clear();
	}

	fn fill(&self, node: &AdminNode) {
		let title = node
			.properties
			.get("title")
			.map(value_text)
			.filter(|t| !t.is_empty())
			.unwrap_or_else(|| node.display_name().to_owned());
		self.title.set(title);
		self.name.set(node.name.clone().unwrap_or_default());
		self.node_type.set(node.node_type.clone().unwrap_or_default());
		self.custom.set(None);
		self.props.fill(&node.properties, &["title", "name", "type"]);
	}

	fn focus(&self, field: FormField) {
		let focused = match field {
			FormField::NodeTitle => self.title_ref.get().map(|el| el.focus()),
			FormField::NodeType => self.type_ref.get().map(|el| el.focus()),
			FormField::CustomType => self.custom_ref.get().map(|el| el.focus()),
			_ => None,
		};
		if let Some(Err(err)) = focused {
			debug!("focus failed: {err:?}");
		}
	}
}

/// Paginated node list with create, view, edit and delete.
#[component]
pub fn NodesPage() -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let toasts = use_notifications();
	let sequencer = RequestSequencer::new();

	let filter_name = RwSignal::new(String::new());
	let filter_type = RwSignal::new(String::new());
	let page = RwSignal::new(1u32);
	let listing = RwSignal::new(None::<NodePage>);
	let list_error = RwSignal::new(None::<String>);
	let types = RwSignal::new(Vec::<TypeCount>::new());
	let editor = RwSignal::new(Editor::Closed);
	let deleting = RwSignal::new(None::<(NodeId, String)>);
	let saving = RwSignal::new(false);
	let deleting_busy = RwSignal::new(false);
	let form = NodeForm::new();

	let load_types = Callback::new({
		let api = api.clone();
		move |_: ()| {
			let api = api.clone();
			spawn_local(async move {
				match api.node_types().await {
					Ok(list) => {
						let details = list.details().to_vec();
						let items = if details.is_empty() {
							list.into_types()
								.into_iter()
								.map(|t| TypeCount {
									type_name: t,
									count: 0,
								})
								.collect()
						} else {
							details
						};
						types.set(items);
					}
					Err(err) => toasts.error(format!("Failed to load node types: {err}")),
				}
			});
		}
	});

	let load_page = Callback::new({
		let (api, sequencer) = (api.clone(), sequencer.clone());
		move |target: u32| {
			let token = sequencer.issue();
			let query = NodeQuery {
				page: target,
				name: filter_name.get_untracked(),
				node_type: filter_type.get_untracked(),
			};
			let (api, sequencer) = (api.clone(), sequencer.clone());
			listing.set(None);
			list_error.set(None);
			spawn_local(async move {
				let result = api.nodes(&query, PAGE_SIZE).await;
				if !sequencer.is_current(token) {
					debug!("discarding stale node page {token}");
					return;
				}
				match result {
					Ok(p) => {
						page.set(p.page.max(1));
						listing.set(Some(p));
					}
					Err(err) => {
						list_error.set(Some(err.to_string()));
						toasts.error(format!("Failed to load nodes: {err}"));
					}
				}
			});
		}
	});

	load_types.run(());
	load_page.run(1);

	let open_existing = Callback::new({
		let api = api.clone();
		move |mode: Editor| {
			let id = match &mode {
				Editor::View(id) | Editor::Edit(id) => id.clone(),
				_ => return,
			};
			let api = api.clone();
			spawn_local(async move {
				match api.node(&id).await {
					Ok(node) => {
						form.fill(&node);
						editor.set(mode);
					}
					Err(err) => toasts.error(format!("Failed to load node: {err}")),
				}
			});
		}
	});

	let open_add = move |_: web_sys::MouseEvent| {
		form.reset(types.get_untracked().first().map(|t| t.type_name.clone()));
		editor.set(Editor::Add);
	};

	let on_type_change = move |ev: web_sys::Event| {
		let value = event_target_value(&ev);
		if value == CUSTOM_TYPE {
			form.custom.set(Some(String::new()));
			form.focus(FormField::CustomType);
		} else {
			form.node_type.set(value);
		}
	};

	let add_custom_type = move |_: web_sys::MouseEvent| {
		let input = form.custom.get_untracked().unwrap_or_default();
		let known: Vec<String> = types.get_untracked().into_iter().map(|t| t.type_name).collect();
		match custom_type(&input, &known) {
			Ok(name) => {
				types.update(|list| {
					list.push(TypeCount {
						type_name: name.clone(),
						count: 0,
					})
				});
				form.node_type.set(name);
				form.custom.set(None);
			}
			Err(err) => {
				toasts.error(err.to_string());
				form.focus(FormField::CustomType);
			}
		}
	};

	let save = Callback::new({
		let api = api.clone();
		move |()| {
			let mode = editor.get_untracked();
			let body = match node_body(
				&form.title.get_untracked(),
				&form.name.get_untracked(),
				&form.node_type.get_untracked(),
				&form.props.snapshot(),
			) {
				Ok(body) => body,
				Err(err) => {
					toasts.error(err.to_string());
					form.focus(err.field());
					return;
				}
			};
			let api = api.clone();
			saving.set(true);
			spawn_local(async move {
				let updating = mode.target().is_some();
				let result = api.save_node(mode.target(), &body).await;
				saving.set(false);
				match result {
					Ok(ack) => {
						let fallback = if updating { "Node updated" } else { "Node created" };
						toasts.success(ack.message.unwrap_or_else(|| fallback.into()));
						editor.set(Editor::Closed);
						load_page.run(page.get_untracked());
						load_types.run(());
					}
					Err(err) => toasts.error(format!("Failed to save node: {err}")),
				}
			});
		}
	});

	let confirm_delete = Callback::new({
		let api = api.clone();
		move |()| {
			let Some((id, _)) = deleting.get_untracked() else {
				return;
			};
			if !claim(deleting_busy) {
				return;
			}
			let api = api.clone();
			spawn_local(async move {
				let result = api.delete_node(&id).await;
				deleting_busy.set(false);
				match result {
					Ok(ack) => {
						toasts.success(ack.message.unwrap_or_else(|| "Node deleted".into()));
						deleting.set(None);
						load_page.run(page.get_untracked());
						load_types.run(());
					}
					Err(err) => toasts.error(format!("Failed to delete node: {err}")),
				}
			});
		}
	});

	let readonly = Signal::derive(move || editor.read().readonly());

	view! {
		<section class="admin-page nodes-page">
			<header class="page-header">
				<h1>"Nodes"</h1>
				<button class="btn primary" on:click=open_add>
					"Add node"
				</button>
			</header>

			<div class="filters">
				<input
					type="text"
					placeholder="Filter by name"
					prop:value=filter_name
					on:input=move |ev| filter_name.set(event_target_value(&ev))
					on:keyup=move |ev| {
						if ev.key() == "Enter" {
							load_page.run(1);
						}
					}
				/>
				<select prop:value=filter_type on:change=move |ev| filter_type.set(event_target_value(&ev))>
					<option value="">"All types"</option>
					<For each=move || types.get() key=|t| t.type_name.clone() let:t>
						<option value=t.type_name.clone()>{type_option_label(&t)}</option>
					</For>
				</select>
				<button class="btn" on:click=move |_| load_page.run(1)>
					"Search"
				</button>
			</div>

			<table class="admin-table">
				<thead>
					<tr>
						<th>"ID"</th>
						<th>"Name"</th>
						<th>"Type"</th>
						<th>"Properties"</th>
						<th>"Actions"</th>
					</tr>
				</thead>
				<tbody>
					{move || match (listing.get(), list_error.get()) {
						(_, Some(err)) => {
							view! {
								<tr>
									<td colspan="5" class="table-error">{format!("Failed to load: {err}")}</td>
								</tr>
							}
								.into_any()
						}
						(None, None) => {
							view! {
								<tr>
									<td colspan="5" class="table-loading">
										<div class="spinner"></div>
									</td>
								</tr>
							}
								.into_any()
						}
						(Some(p), None) if p.nodes.is_empty() => {
							view! {
								<tr>
									<td colspan="5" class="table-empty">"No nodes match these filters"</td>
								</tr>
							}
								.into_any()
						}
						(Some(p), None) => {
							p.nodes
								.into_iter()
								.map(|node| {
									let display = node.display_name().to_owned();
									let system_name = node
										.name
										.clone()
										.filter(|n| !n.is_empty() && *n != display);
									let (view_id, edit_id, del_id) = (node.id.clone(), node.id.clone(), node.id.clone());
									let del_name = display.clone();
									view! {
										<tr>
											<td>{node.id.to_string()}</td>
											<td>
												<strong>{display}</strong>
												{system_name.map(|n| view! { <small class="muted">{format!(" (system name: {n})")}</small> })}
											</td>
											<td>
												<span class="badge">{node.type_name().to_owned()}</span>
											</td>
											<td>{node.property_count()}</td>
											<td class="actions">
												<button
													class="btn small"
													title="View"
													on:click=move |_| open_existing.run(Editor::View(view_id.clone()))
												>
													"View"
												</button>
												<button
													class="btn small"
													title="Edit"
													on:click=move |_| open_existing.run(Editor::Edit(edit_id.clone()))
												>
													"Edit"
												</button>
												<button
													class="btn small danger"
													title="Delete"
													on:click=move |_| deleting.set(Some((del_id.clone(), del_name.clone())))
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
							<h2>{move || editor.read().title()}</h2>
							<button class="close" aria-label="Close" on:click=move |_| editor.set(Editor::Closed)>
								"×"
							</button>
						</header>
						<div class="modal-body">
							<label>"Title"</label>
							<input
								node_ref=form.title_ref
								type="text"
								prop:value=form.title
								prop:readonly=readonly
								on:input=move |ev| form.title.set(event_target_value(&ev))
							/>
							<label>"System name"</label>
							<input
								type="text"
								placeholder="Defaults to the title"
								prop:value=form.name
								prop:readonly=readonly
								on:input=move |ev| form.name.set(event_target_value(&ev))
							/>
							<label>"Type"</label>
							<select
								node_ref=form.type_ref
								prop:value=form.node_type
								prop:disabled=readonly
								on:change=on_type_change
							>
								<For each=move || types.get() key=|t| t.type_name.clone() let:t>
									<option value=t.type_name.clone()>{type_option_label(&t)}</option>
								</For>
								<option value=CUSTOM_TYPE>"-- Add custom type --"</option>
							</select>
							<Show when=move || form.custom.read().is_some()>
								<div class="custom-type">
									<input
										node_ref=form.custom_ref
										type="text"
										placeholder="New type name"
										prop:value=move || form.custom.get().unwrap_or_default()
										on:input=move |ev| form.custom.set(Some(event_target_value(&ev)))
									/>
									<button class="btn" on:click=add_custom_type>
										"Add type"
									</button>
									<button class="btn" on:click=move |_| form.custom.set(None)>
										"Cancel"
									</button>
								</div>
							</Show>
							<label>"Properties"</label>
							<PropertyEditor fields=form.props readonly=readonly />
						</div>
						<footer class="modal-footer">
							<button class="btn" on:click=move |_| editor.set(Editor::Closed)>
								"Close"
							</button>
							<Show when=move || !readonly.get()>
								<button class="btn primary" disabled=move || saving.get() on:click=move |_| save.run(())>
									{move || if saving.get() { "Saving..." } else { "Save" }}
								</button>
							</Show>
						</footer>
					</div>
				</div>
			</Show>

			<Show when=move || deleting.read().is_some()>
				<div class="modal-backdrop">
					<div class="modal small">
						<h2>"Delete node"</h2>
						<p>
							{move || {
								let name = deleting.read().as_ref().map(|(_, n)| n.clone()).unwrap_or_default();
								format!("Delete \"{name}\" and all of its relations?")
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
	fn only_edit_mode_targets_an_existing_node() {
		let id = NodeId::from("7");
		assert_eq!(Editor::Edit(id.clone()).target(), Some(&id));
		assert_eq!(Editor::Add.target(), None);
		assert!(Editor::View(id).readonly());
		assert!(!Editor::Add.readonly());
	}

	#[test]
	fn type_options_show_counts() {
		let item = TypeCount {
			type_name: "Paper".into(),
			count: 12,
		};
		assert_eq!(type_option_label(&item), "Paper (12)");
	}
}
