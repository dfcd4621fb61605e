use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen_futures::spawn_local;

use crate::api::{ApiClient, NodeQuery, RequestError, RequestSequencer};
use crate::components::force_graph::{ForceGraphCanvas, GraphCommand, GraphData, GraphNode, Highlight, NodeId};
use crate::components::node_details::NodeDetails;
use crate::components::toast::{NotificationState, use_notifications};
use crate::config::AppConfig;
use crate::validation::subgraph_id;

pub const DEFAULT_LIMIT: u32 = 100;
const ZOOM_IN: f64 = 1.5;
const ZOOM_OUT: f64 = 0.67;

/// Server-side filters that produced the current view.
#[derive(Clone, Debug, Default, PartialEq)]
struct Filter {
	search: String,
	relation: String,
}

impl Filter {
	fn is_empty(&self) -> bool {
		self.search.trim().is_empty() && self.relation.is_empty()
	}

	/// Text for the breadcrumb: the search term, else the relation.
	fn label(&self) -> &str {
		match self.search.trim() {
			"" => &self.relation,
			s => s,
		}
	}
}

/// What a finished load turned into.
enum Loaded {
	Graph(GraphData),
	/// Nothing matched the active filter.
	NoMatch(GraphData),
	/// The database has no nodes at all.
	EmptyDatabase,
}

/// First node of the admin list, expanded to its neighborhood.
async fn load_default(api: &ApiClient, limit: u32) -> Result<Loaded, RequestError> {
	let page = api.nodes(&NodeQuery::default(), 1).await?;
	let Some(first) = page.nodes.into_iter().next() else {
		return Ok(Loaded::EmptyDatabase);
	};
	info!("no graph data; falling back to node {}", first.id);
	let numeric = subgraph_id(&first.id).map_err(|e| RequestError::Schema(e.to_string()))?;
	api.subgraph(&first.id, numeric, limit).await.map(Loaded::Graph)
}

async fn load(api: &ApiClient, filter: &Filter, limit: u32) -> Result<Loaded, RequestError> {
	let data = api.graph(limit, &filter.search, &filter.relation).await?;
	if !data.nodes.is_empty() {
		return Ok(Loaded::Graph(data));
	}
	if filter.is_empty() {
		load_default(api, limit).await
	} else {
		Ok(Loaded::NoMatch(data))
	}
}

/// Signals the explorer's loads write into.
#[derive(Clone, Copy)]
struct ViewSignals {
	data: RwSignal<GraphData>,
	applied: RwSignal<Filter>,
	loading: RwSignal<bool>,
	error: RwSignal<Option<String>>,
	toasts: NotificationState,
}

impl ViewSignals {
	fn begin(&self) {
		self.loading.set(true);
		self.error.set(None);
	}

	fn apply(&self, result: Result<Loaded, RequestError>, filter: Filter, what: &str) {
		self.loading.set(false);
		match result {
			Ok(Loaded::Graph(data)) => {
				info!("{what}: {} nodes, {} links", data.nodes.len(), data.links.len());
				self.applied.set(filter);
				self.data.set(data);
			}
			Ok(Loaded::NoMatch(data)) => {
				self.toasts.info(format!("No nodes found for \"{}\"", filter.label()));
				self.applied.set(filter);
				self.data.set(data);
			}
			Ok(Loaded::EmptyDatabase) => {
				self.error.set(Some("The database has no nodes yet".into()));
			}
			Err(err) => {
				self.toasts.error(format!("Failed to load {what}: {err}"));
				self.error.set(Some(
					"Could not load the graph. Check the connection and try again.".into(),
				));
			}
		}
	}
}

/// Graph explorer: server-filtered graph on a force-directed canvas.
#[component]
pub fn GraphPage() -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let config = expect_context::<AppConfig>();
	let toasts = use_notifications();
	let sequencer = RequestSequencer::new();

	let search = RwSignal::new(String::new());
	let relation = RwSignal::new(String::new());
	let limit = RwSignal::new(DEFAULT_LIMIT);
	let relation_types = RwSignal::new(Vec::<String>::new());
	let show_labels = RwSignal::new(true);
	let panel_open = RwSignal::new(true);
	let command = RwSignal::new(None::<GraphCommand>);
	let selected = RwSignal::new(None::<GraphNode>);
	let screen = ViewSignals {
		data: RwSignal::new(GraphData::default()),
		applied: RwSignal::new(Filter::default()),
		loading: RwSignal::new(false),
		error: RwSignal::new(None),
		toasts,
	};

	let reload = Callback::new({
		let (api, sequencer) = (api.clone(), sequencer.clone());
		move |_: ()| {
			let token = sequencer.issue();
			let filter = Filter {
				search: search.get_untracked(),
				relation: relation.get_untracked(),
			};
			let limit = limit.get_untracked();
			let (api, sequencer) = (api.clone(), sequencer.clone());
			screen.begin();
			spawn_local(async move {
				let result = load(&api, &filter, limit).await;
				if !sequencer.is_current(token) {
					debug!("discarding stale graph response {token}");
					return;
				}
				screen.apply(result, filter, "graph");
			});
		}
	});

	let expand = Callback::new({
		let (api, sequencer) = (api.clone(), sequencer.clone());
		move |id: NodeId| {
			let numeric = match subgraph_id(&id) {
				Ok(n) => n,
				Err(err) => {
					warn!("{err}");
					toasts.error(err.to_string());
					return;
				}
			};
			let token = sequencer.issue();
			let limit = limit.get_untracked();
			let filter = screen.applied.get_untracked();
			let (api, sequencer) = (api.clone(), sequencer.clone());
			screen.begin();
			spawn_local(async move {
				let result = api.subgraph(&id, numeric, limit).await.map(Loaded::Graph);
				if !sequencer.is_current(token) {
					debug!("discarding stale subgraph response {token}");
					return;
				}
				screen.apply(result, filter, "subgraph");
			});
		}
	});

	spawn_local({
		let api = api.clone();
		async move {
			match api.relation_types().await {
				Ok(types) => relation_types.set(types.into_types()),
				Err(err) => toasts.error(format!("Failed to load relation types: {err}")),
			}
		}
	});
	reload.run(());

	let clear_search = move |_: web_sys::MouseEvent| {
		search.set(String::new());
		relation.set(String::new());
		reload.run(());
	};

	let counts = move || {
		let d = screen.data.read();
		format!("{} nodes, {} relations", d.nodes.len(), d.links.len())
	};

	view! {
		<div class="graph-page">
			<aside class="search-panel" class:collapsed=move || !panel_open.get()>
				<button
					class="toggle-panel"
					title="Toggle panel"
					on:click=move |_| panel_open.update(|open| *open = !*open)
				>
					{move || if panel_open.get() { "‹" } else { "›" }}
				</button>
				<div class="panel-body">
					<label for="node-search">"Search nodes"</label>
					<input
						id="node-search"
						type="text"
						placeholder="Name contains..."
						prop:value=search
						on:input=move |ev| search.set(event_target_value(&ev))
						on:keyup=move |ev| {
							if ev.key() == "Enter" {
								reload.run(());
							}
						}
					/>
					<label for="relation-filter">"Relation"</label>
					<select
						id="relation-filter"
						prop:value=relation
						on:change=move |ev| {
							relation.set(event_target_value(&ev));
							reload.run(());
						}
					>
						<option value="">"All relations"</option>
						<For each=move || relation_types.get() key=|t| t.clone() let:t>
							<option value=t.clone()>{t.clone()}</option>
						</For>
					</select>
					<label for="node-limit">"Node limit"</label>
					<input
						id="node-limit"
						type="number"
						min="1"
						prop:value=move || limit.get().to_string()
						on:change=move |ev| {
							if let Ok(n) = event_target_value(&ev).parse::<u32>() {
								limit.set(n.max(1));
							}
						}
					/>
					<button class="btn primary" on:click=move |_| reload.run(())>
						"Update graph"
					</button>
					<p class="count-display">{counts}</p>
				</div>
			</aside>

			<div class="graph-container">
				<Show when=move || !screen.applied.read().is_empty()>
					<div class="search-breadcrumb">
						<span>{move || format!("Search: \"{}\"", screen.applied.read().label())}</span>
						<button class="btn-link" title="Clear search" on:click=clear_search>
							"×"
						</button>
					</div>
				</Show>

				<ForceGraphCanvas
					data=screen.data
					highlight=Signal::stored(Highlight::default())
					show_edge_labels=show_labels
					command=command
					on_select={move |node: Option<GraphNode>| selected.set(node)}
					on_expand=expand
					config={config.explorer.clone()}
				/>

				<div class="graph-controls">
					<button title="Zoom in" on:click=move |_| command.set(Some(GraphCommand::ZoomBy(ZOOM_IN)))>
						"+"
					</button>
					<button title="Zoom out" on:click=move |_| command.set(Some(GraphCommand::ZoomBy(ZOOM_OUT)))>
						"−"
					</button>
					<button title="Fit" on:click=move |_| command.set(Some(GraphCommand::ResetZoom))>
						"⤢"
					</button>
					<button
						title=move || if show_labels.get() { "Hide relation labels" } else { "Show relation labels" }
						class:active=move || show_labels.get()
						on:click=move |_| show_labels.update(|v| *v = !*v)
					>
						"Aa"
					</button>
				</div>

				<Show when=move || screen.loading.get()>
					<div class="loading-overlay">
						<div class="spinner"></div>
					</div>
				</Show>
				{move || {
					screen.error
						.get()
						.map(|msg| {
							view! {
								<div class="graph-error">
									<p>{msg}</p>
									<button class="btn" on:click=move |_| reload.run(())>
										"Retry"
									</button>
								</div>
							}
						})
				}}
			</div>

			<NodeDetails node=selected on_close={move |_: ()| command.set(Some(GraphCommand::ClearSelection))} />
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn breadcrumb_prefers_search_text() {
		let both = Filter {
			search: " ada ".into(),
			relation: "CITES".into(),
		};
		assert_eq!(both.label(), "ada");
		let relation_only = Filter {
			search: "  ".into(),
			relation: "CITES".into(),
		};
		assert_eq!(relation_only.label(), "CITES");
		assert!(!relation_only.is_empty());
		assert!(Filter::default().is_empty());
	}
}
