use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::ApiClient;
use crate::api::types::Stats;
use crate::components::charts::{BarChart, DoughnutChart, format_count};
use crate::components::force_graph::StyleTable;
use crate::components::toast::use_notifications;

#[component]
fn StatCard(label: &'static str, #[prop(into)] value: Signal<Option<u64>>) -> impl IntoView {
	view! {
		<div class="stat-card">
			<div class="stat-value">{move || value.get().map(format_count).unwrap_or_else(|| "-".into())}</div>
			<div class="stat-label">{label}</div>
		</div>
	}
}

#[component]
fn TypeBadges(#[prop(into)] types: Signal<Vec<String>>, colored: bool) -> impl IntoView {
	view! {
		<div class="type-badges">
			<For each=move || types.get() key=|t| t.clone() let:t>
				<span
					class="badge"
					style={
						if colored { format!("background-color: {}", StyleTable::EXPLORER.color(&t)) } else { String::new() }
					}
				>
					{t.clone()}
				</span>
			</For>
		</div>
	}
}

/// Counts and per-type distributions of the whole graph.
#[component]
pub fn StatsPage() -> impl IntoView {
	let api = expect_context::<ApiClient>();
	let toasts = use_notifications();
	let stats = RwSignal::new(None::<Stats>);
	let node_types = RwSignal::new(Vec::<String>::new());
	let relation_types = RwSignal::new(Vec::<String>::new());

	spawn_local({
		let api = api.clone();
		async move {
			match api.stats().await {
				Ok(s) => stats.set(Some(s)),
				Err(err) => toasts.error(format!("Failed to load statistics: {err}")),
			}
		}
	});
	spawn_local({
		let api = api.clone();
		async move {
			match api.node_types_with_retry().await {
				Ok(list) => node_types.set(list.into_types()),
				Err(err) => toasts.error(format!("Failed to load node types: {err}")),
			}
		}
	});
	spawn_local(async move {
		match api.relation_types_with_retry().await {
			Ok(list) => relation_types.set(list.into_types()),
			Err(err) => toasts.error(format!("Failed to load relation types: {err}")),
		}
	});

	let field = move |f: fn(&Stats) -> u64| Signal::derive(move || stats.read().as_ref().map(f));

	view! {
		<section class="stats-page">
			<h1>"Statistics"</h1>
			<div class="stat-cards">
				<StatCard label="Nodes" value=field(|s| s.node_count) />
				<StatCard label="Relations" value=field(|s| s.relation_count) />
				<StatCard label="Node types" value=field(|s| s.node_types.len() as u64) />
				<StatCard label="Relation types" value=field(|s| s.relation_types.len() as u64) />
			</div>
			<div class="charts">
				<div class="chart-card">
					<h2>"Node type distribution"</h2>
					<DoughnutChart items=Signal::derive(move || {
						stats.read().as_ref().map(|s| s.node_types.clone()).unwrap_or_default()
					}) />
				</div>
				<div class="chart-card">
					<h2>"Top relation types"</h2>
					<BarChart items=Signal::derive(move || {
						stats.read().as_ref().map(|s| s.relation_types.clone()).unwrap_or_default()
					}) />
				</div>
			</div>
			<h2>"Node types"</h2>
			<TypeBadges types=node_types colored=true />
			<h2>"Relation types"</h2>
			<TypeBadges types=relation_types colored=false />
		</section>
	}
}
