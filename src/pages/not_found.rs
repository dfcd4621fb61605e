use leptos::prelude::*;
use leptos_router::components::A;

/// Fallback for unknown routes.
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<section class="not-found">
			<h1>"Page not found"</h1>
			<p>"Nothing lives at this address."</p>
			<A href="/">"Back to the graph"</A>
		</section>
	}
}
