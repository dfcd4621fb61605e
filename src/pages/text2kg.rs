use std::collections::BTreeSet;

use gloo_timers::callback::Timeout;
use leptos::html::Input;
use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;
use web_sys::FormData;

use crate::api::types::Extraction;
use crate::api::{ApiClient, RequestError, RequestSequencer};
use crate::components::force_graph::{ForceGraphCanvas, GraphCommand, GraphData, GraphNode, Highlight, StyleTable};
use crate::components::node_details::NodeDetails;
use crate::config::GraphConfig;
use crate::validation::{ValidationError, extraction_text};

const ZOOM_STEP: f64 = 1.2;
/// How long the save button stays marked after a successful save.
const SAVED_MS: u32 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
	File,
	Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusKind {
	Info,
	Success,
	Error,
}

impl StatusKind {
	fn class(self) -> &'static str {
		match self {
			StatusKind::Info => "status-bar info",
			StatusKind::Success => "status-bar success",
			StatusKind::Error => "status-bar error",
		}
	}
}

/// Entity types present in `data`, in first-seen order without repeats.
fn present_types(data: &GraphData) -> Vec<String> {
	let mut seen = BTreeSet::new();
	data.nodes
		.iter()
		.filter(|n| seen.insert(n.node_type.clone()))
		.map(|n| n.node_type.clone())
		.collect()
}

/// One line of the related-relations list: arrow direction plus the other end.
fn relation_lines(extraction: &Extraction, name: &str) -> Vec<String> {
	extraction
		.relations_of(name)
		.map(|r| {
			if r.source == name {
				format!("→ {} ({})", r.target, r.relation)
			} else {
				format!("{} ({}) ←", r.source, r.relation)
			}
		})
		.collect()
}

fn file_form(input: &NodeRef<Input>) -> Result<FormData, ValidationError> {
	let file = input
		.get()
		.and_then(|el| el.files())
		.and_then(|files| files.get(0))
		.ok_or(ValidationError::NoFile)?;
	let form = FormData::new().map_err(|_| ValidationError::NoFile)?;
	form.append_with_blob_and_filename("file", &file, &file.name())
		.map_err(|_| ValidationError::NoFile)?;
	Ok(form)
}

/// Extraction demo: turn a file or pasted text into a graph, explore it, save it.
#[component]
pub fn Text2KgPage() -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let sequencer = RequestSequencer::new();

	let tab = RwSignal::new(Tab::File);
	let text = RwSignal::new(String::new());
	let file_name = RwSignal::new(None::<String>);
	let file_ref = NodeRef::<Input>::new();
	let status = RwSignal::new(None::<(String, StatusKind)>);
	let extraction = RwSignal::new(None::<Extraction>);
	let selected = RwSignal::new(None::<GraphNode>);
	let search = RwSignal::new(String::new());
	let hidden = RwSignal::new(BTreeSet::<String>::new());
	let legend_open = RwSignal::new(true);
	let search_open = RwSignal::new(true);
	let command = RwSignal::new(None::<GraphCommand>);
	let busy = RwSignal::new(false);
	let saved = RwSignal::new(false);

	let show = move |msg: String, kind: StatusKind| status.set(Some((msg, kind)));

	let data = Memo::new(move |_| extraction.read().as_ref().map(Extraction::to_graph).unwrap_or_default());
	let highlight = Signal::derive(move || Highlight {
		search: search.get(),
		hidden_types: hidden.get(),
	});

	let run = Callback::new({
		let (api, sequencer) = (api.clone(), sequencer.clone());
		move |source: Tab| {
			let form = match source {
				Tab::File => match file_form(&file_ref) {
					Ok(form) => Some(form),
					Err(err) => {
						show(err.to_string(), StatusKind::Error);
						return;
					}
				},
				Tab::Text => None,
			};
			let body = text.get_untracked();
			if form.is_none() {
				if let Err(err) = extraction_text(&body) {
					show(err.to_string(), StatusKind::Error);
					return;
				}
			}
			let token = sequencer.issue();
			let (api, sequencer) = (api.clone(), sequencer.clone());
			busy.set(true);
			show(
				match source {
					Tab::File => "Uploading and processing the file...".into(),
					Tab::Text => "Processing the text...".into(),
				},
				StatusKind::Info,
			);
			spawn_local(async move {
				let result: Result<Extraction, RequestError> = match form {
					Some(form) => api.upload(form).await,
					None => api.process_text(body.trim()).await,
				};
				if !sequencer.is_current(token) {
					return;
				}
				busy.set(false);
				match result {
					Ok(found) => {
						info!("extracted {} entities, {} relations", found.entities.len(), found.relations.len());
						show("Processed; building the graph".into(), StatusKind::Success);
						selected.set(None);
						command.set(Some(GraphCommand::ClearSelection));
						hidden.set(BTreeSet::new());
						extraction.set(Some(found));
					}
					Err(err) => {
						error!("extraction failed: {err}");
						show(format!("Processing failed: {err}"), StatusKind::Error);
					}
				}
			});
		}
	});

	let save = move |_: web_sys::MouseEvent| {
		let Some(current) = extraction.get_untracked().filter(|e| !e.is_empty()) else {
			show(ValidationError::NothingToSave.to_string(), StatusKind::Error);
			return;
		};
		let api = api.clone();
		show("Saving to the database...".into(), StatusKind::Info);
		spawn_local(async move {
			match api.save_extraction(&current).await {
				Ok(_) => {
					show("Saved to the database".into(), StatusKind::Success);
					saved.set(true);
					Timeout::new(SAVED_MS, move || {
						let _ = saved.try_set(false);
					})
					.forget();
				}
				Err(err) => show(format!("Save failed: {err}"), StatusKind::Error),
			}
		});
	};

	let toggle_type = move |t: String, visible: bool| {
		hidden.update(|set| {
			if visible {
				set.remove(&t);
			} else {
				set.insert(t);
			}
		})
	};

	view! {
		<section class="text2kg-page">
			<div class="input-panel">
				<div class="tabs">
					<button class="tab-btn" class:active=move || tab.get() == Tab::File on:click=move |_| tab.set(Tab::File)>
						"Upload file"
					</button>
					<button class="tab-btn" class:active=move || tab.get() == Tab::Text on:click=move |_| tab.set(Tab::Text)>
						"Paste text"
					</button>
				</div>
				<Show when=move || tab.get() == Tab::File>
					<div class="tab-pane">
						<input
							node_ref=file_ref
							type="file"
							accept=".txt,.md,.pdf,.docx"
							on:change=move |_| {
								let name = file_ref
									.get()
									.and_then(|el| el.files())
									.and_then(|files| files.get(0))
									.map(|f| f.name());
								file_name.set(name);
							}
						/>
						<span class="file-name">{move || file_name.get().unwrap_or_else(|| "No file chosen".into())}</span>
						<button class="btn primary" disabled=move || busy.get() on:click=move |_| run.run(Tab::File)>
							"Upload and extract"
						</button>
					</div>
				</Show>
				<Show when=move || tab.get() == Tab::Text>
					<div class="tab-pane">
						<textarea
							rows="8"
							placeholder="Paste text to extract entities and relations from"
							prop:value=text
							on:input=move |ev| text.set(event_target_value(&ev))
						></textarea>
						<button class="btn primary" disabled=move || busy.get() on:click=move |_| run.run(Tab::Text)>
							"Extract"
						</button>
					</div>
				</Show>
				{move || status.get().map(|(msg, kind)| view! { <div class=kind.class()>{msg}</div> })}
			</div>

			<div class="graph-area">
				<div class="graph-toolbar">
					<button title="Zoom in" on:click=move |_| command.set(Some(GraphCommand::ZoomBy(ZOOM_STEP)))>
						"+"
					</button>
					<button title="Zoom out" on:click=move |_| command.set(Some(GraphCommand::ZoomBy(1.0 / ZOOM_STEP)))>
						"−"
					</button>
					<button title="Reset view" on:click=move |_| command.set(Some(GraphCommand::ResetZoom))>
						"⤢"
					</button>
					<button
						title="Legend"
						class:active=move || legend_open.get()
						on:click=move |_| legend_open.update(|v| *v = !*v)
					>
						"Legend"
					</button>
					<button
						title="Search"
						class:active=move || search_open.get()
						on:click=move |_| search_open.update(|v| *v = !*v)
					>
						"Search"
					</button>
					<button title="Save to database" class:active=move || saved.get() on:click=save>
						"Save"
					</button>
				</div>

				<div class="graph-container">
					<ForceGraphCanvas
						data=data
						highlight=highlight
						show_edge_labels=Signal::stored(true)
						command=command
						on_select={move |node: Option<GraphNode>| selected.set(node)}
						config=GraphConfig::extraction()
						styles=StyleTable::EXTRACTION
						clear_on_background=true
					/>

					<Show when=move || search_open.get() && extraction.read().is_some()>
						<div class="search-panel floating">
							<input
								type="text"
								placeholder="Search entities..."
								prop:value=search
								on:input=move |ev| search.set(event_target_value(&ev))
							/>
							<div class="filter-section">
								<strong>"Entity types"</strong>
								<For each=move || present_types(&data.read()) key=|t| t.clone() let:t>
									{
										let id = format!("filter-{t}");
										let color = format!("color: {}", StyleTable::EXTRACTION.color(&t));
										let checked_t = t.clone();
										let change_t = t.clone();
										view! {
											<div class="filter-item">
												<input
													type="checkbox"
													id=id.clone()
													prop:checked=move || !hidden.read().contains(&checked_t)
													on:change=move |ev| toggle_type(change_t.clone(), event_target_checked(&ev))
												/>
												<label for=id style=color>
													{t.clone()}
												</label>
											</div>
										}
									}
								</For>
							</div>
						</div>
					</Show>

					<Show when=move || legend_open.get()>
						<div class="legend">
							<strong>"Entity types"</strong>
							{StyleTable::EXTRACTION
								.types()
								.map(|t| {
									view! {
										<div class="legend-item">
											<span class="swatch" style=format!("background:{}", StyleTable::EXTRACTION.color(t))></span>
											{t}
										</div>
									}
								})
								.collect_view()}
						</div>
					</Show>
				</div>
			</div>

			<NodeDetails
				node=selected
				styles=StyleTable::EXTRACTION
				on_close={move |_: ()| command.set(Some(GraphCommand::ClearSelection))}
			>
				{move || {
					let name = selected.read().as_ref().map(|n| n.name.clone()).unwrap_or_default();
					let lines = extraction.read().as_ref().map(|e| relation_lines(e, &name)).unwrap_or_default();
					(!lines.is_empty())
						.then(|| {
							view! {
								<div class="entity-relations">
									<strong>"Related relations"</strong>
									<ul>{lines.into_iter().map(|l| view! { <li>{l}</li> }).collect_view()}</ul>
								</div>
							}
						})
				}}
			</NodeDetails>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::types::{Entity, Triple};
	use crate::components::force_graph::Properties;

	fn sample() -> Extraction {
		let entity = |name: &str, t: &str| Entity {
			name: name.into(),
			entity_type: t.into(),
			properties: Properties::new(),
		};
		let triple = |s: &str, r: &str, t: &str| Triple {
			source: s.into(),
			target: t.into(),
			relation: r.into(),
		};
		Extraction {
			entities: vec![entity("Ada", "Person"), entity("London", "Location"), entity("Babbage", "Person")],
			relations: vec![triple("Ada", "born_in", "London"), triple("Babbage", "worked_with", "Ada")],
		}
	}

	#[test]
	fn related_lines_show_direction() {
		let lines = relation_lines(&sample(), "Ada");
		assert_eq!(lines, vec!["→ London (born_in)", "Babbage (worked_with) ←"]);
		assert!(relation_lines(&sample(), "Nobody").is_empty());
	}

	#[test]
	fn types_listed_once_in_first_seen_order() {
		let data = sample().to_graph();
		assert_eq!(present_types(&data), vec!["Person", "Location"]);
	}
}
