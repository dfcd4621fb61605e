use leptos::prelude::*;

/// Number of page buttons shown at most.
const WINDOW: u32 = 5;

/// Inclusive range of page numbers to show around `current`.
///
/// Keeps `current` two from the left edge where possible and slides left
/// near the end so the window stays full.
pub fn page_window(current: u32, total: u32) -> Option<(u32, u32)> {
	if total <= 1 {
		return None;
	}
	let current = current.clamp(1, total);
	let mut start = current.saturating_sub(2).max(1);
	let end = (start + WINDOW - 1).min(total);
	if end - start < WINDOW - 1 {
		start = end.saturating_sub(WINDOW - 1).max(1);
	}
	Some((start, end))
}

/// Previous/next plus a sliding window of page buttons. Hidden for a single page.
#[component]
pub fn Pagination(
	#[prop(into)] current: Signal<u32>,
	#[prop(into)] total: Signal<u32>,
	#[prop(into)] on_page: Callback<u32>,
) -> impl IntoView {
	move || {
		let (cur, pages) = (current.get(), total.get());
		page_window(cur, pages).map(|(start, end)| {
			view! {
				<nav class="pagination" aria-label="Pages">
					<button class="page-btn" disabled={cur <= 1} on:click=move |_| on_page.run(cur - 1)>
						"«"
					</button>
					{(start..=end)
						.map(|p| {
							view! {
								<button
									class="page-btn"
									class:active={p == cur}
									on:click=move |_| on_page.run(p)
								>
									{p}
								</button>
							}
						})
						.collect_view()}
					<button class="page-btn" disabled={cur >= pages} on:click=move |_| on_page.run(cur + 1)>
						"»"
					</button>
				</nav>
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_page_hides_the_bar() {
		assert_eq!(page_window(1, 0), None);
		assert_eq!(page_window(1, 1), None);
	}

	#[test]
	fn window_follows_current_page() {
		assert_eq!(page_window(1, 10), Some((1, 5)));
		assert_eq!(page_window(6, 10), Some((4, 8)));
		assert_eq!(page_window(10, 10), Some((6, 10)));
		assert_eq!(page_window(9, 10), Some((6, 10)));
	}

	#[test]
	fn short_lists_show_every_page() {
		assert_eq!(page_window(2, 3), Some((1, 3)));
		assert_eq!(page_window(7, 3), Some((1, 3)));
	}
}
