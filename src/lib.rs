//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod api;
mod components;
mod config;
mod pages;
mod validation;

use crate::api::ApiClient;
use crate::components::toast::{ToastContainer, provide_notifications};
use crate::config::AppConfig;
// Top-Level pages
use crate::pages::graph::GraphPage;
use crate::pages::nodes::NodesPage;
use crate::pages::not_found::NotFound;
use crate::pages::relations::RelationsPage;
use crate::pages::stats::StatsPage;
use crate::pages::text2kg::Text2KgPage;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

#[component]
fn NavBar() -> impl IntoView {
	view! {
		<nav class="navbar">
			<span class="brand">"Knowledge Graph"</span>
			<A href="/graph">"Explorer"</A>
			<A href="/nodes">"Nodes"</A>
			<A href="/relations">"Relations"</A>
			<A href="/stats">"Statistics"</A>
			<A href="/text2kg">"Text to graph"</A>
		</nav>
	}
}

/// The app shell: shared API client, notifications, navigation and routes.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = AppConfig::from_document();
	info!("API base: {:?}", config.api_base);
	provide_context(ApiClient::new(config.api_base.clone()));
	provide_context(config);
	provide_notifications();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Knowledge Graph Explorer" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<NavBar />
			<main class="content">
				<ErrorBoundary fallback=|errors| {
					view! {
						<h1>"Uh oh! Something went wrong!"</h1>

						<p>"Errors: "</p>
						<ul>
							{move || {
								errors
									.get()
									.into_iter()
									.map(|(_, e)| view! { <li>{e.to_string()}</li> })
									.collect_view()
							}}
						</ul>
					}
				}>
					<Routes fallback=|| view! { <NotFound /> }>
						<Route path=path!("/") view=GraphPage />
						<Route path=path!("/graph") view=GraphPage />
						<Route path=path!("/nodes") view=NodesPage />
						<Route path=path!("/relations") view=RelationsPage />
						<Route path=path!("/stats") view=StatsPage />
						<Route path=path!("/text2kg") view=Text2KgPage />
					</Routes>
				</ErrorBoundary>
			</main>
		</Router>
		<ToastContainer />
	}
}
