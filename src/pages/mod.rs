//! Routed pages.

use leptos::prelude::*;

pub mod graph;
pub mod nodes;
pub mod not_found;
pub mod relations;
pub mod stats;
pub mod text2kg;

/// Sets `busy` and returns true, unless a request already holds it.
fn claim(busy: RwSignal<bool>) -> bool {
	if busy.get_untracked() {
		return false;
	}
	busy.set(true);
	true
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn second_claim_waits_for_release() {
		let busy = RwSignal::new(false);
		assert!(claim(busy));
		assert!(!claim(busy));
		busy.set(false);
		assert!(claim(busy));
	}
}
