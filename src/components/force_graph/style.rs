/// Names longer than this are shortened on canvas labels.
pub const LABEL_MAX_CHARS: usize = 12;
/// Characters kept from a shortened label, before the ellipsis.
pub const LABEL_KEEP_CHARS: usize = 10;
pub const ELLIPSIS: &str = "...";

pub const DEFAULT_STROKE: &str = "#ffffff";
pub const SELECTED_STROKE: &str = "#ff4500";
pub const SELECTED_SCALE: f64 = 1.2;
pub const EDGE_COLOR: &str = "#999999";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius: f64,
	pub fill: &'static str,
}

/// Static type → style lookup with a fallback for unknown types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleTable {
	entries: &'static [(&'static str, NodeStyle)],
	fallback: NodeStyle,
}

const fn style(radius: f64, fill: &'static str) -> NodeStyle {
	NodeStyle { radius, fill }
}

const EXPLORER: &[(&str, NodeStyle)] = &[
	("Professor", style(20.0, "#e41a1c")),
	("Research", style(15.0, "#4daf4a")),
	("ResearchField", style(15.0, "#2ecc71")),
	("Publication", style(15.0, "#377eb8")),
	("Paper", style(15.0, "#f1c40f")),
	("Work", style(15.0, "#3498db")),
	("Institution", style(15.0, "#9b59b6")),
	("Topic", style(15.0, "#ff7f00")),
	("Conference", style(15.0, "#984ea3")),
	("Journal", style(15.0, "#a65628")),
];

const EXTRACTION: &[(&str, NodeStyle)] = &[
	("Person", style(15.0, "#1f77b4")),
	("Organization", style(15.0, "#ff7f0e")),
	("Location", style(15.0, "#2ca02c")),
	("Event", style(15.0, "#d62728")),
	("Time", style(15.0, "#9467bd")),
	("Money", style(15.0, "#e377c2")),
	("Concept", style(15.0, "#8c564b")),
	("Other", style(15.0, "#7f7f7f")),
];

impl StyleTable {
	/// Palette of the database explorer and admin pages.
	pub const EXPLORER: StyleTable = StyleTable {
		entries: EXPLORER,
		fallback: style(15.0, "#999999"),
	};

	/// Palette of the text extraction demo.
	pub const EXTRACTION: StyleTable = StyleTable {
		entries: EXTRACTION,
		fallback: style(15.0, "#8c564b"),
	};

	pub fn lookup(&self, node_type: &str) -> NodeStyle {
		self.entries
			.iter()
			.find(|(t, _)| *t == node_type)
			.map(|(_, s)| *s)
			.unwrap_or(self.fallback)
	}

	pub fn color(&self, node_type: &str) -> &'static str {
		self.lookup(node_type).fill
	}

	/// Known type names, in legend order.
	pub fn types(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.entries.iter().map(|(t, _)| *t)
	}
}

impl Default for StyleTable {
	fn default() -> Self {
		Self::EXPLORER
	}
}

/// Shortens `name` to [`LABEL_KEEP_CHARS`] characters plus an ellipsis when it
/// exceeds [`LABEL_MAX_CHARS`].
pub fn truncate_label(name: &str) -> String {
	if name.chars().count() <= LABEL_MAX_CHARS {
		return name.to_owned();
	}
	let mut out: String = name.chars().take(LABEL_KEEP_CHARS).collect();
	out.push_str(ELLIPSIS);
	out
}

pub fn edge_width(weight: Option<f64>) -> f64 {
	weight.map(|w| w.clamp(1.0, 5.0)).unwrap_or(1.5)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_name_keeps_ten_chars_and_ellipsis() {
		let label = truncate_label("Fifteen chars!!");
		assert_eq!(label, "Fifteen ch...");
		assert_eq!(label.chars().count(), LABEL_KEEP_CHARS + ELLIPSIS.len());
	}

	#[test]
	fn short_names_untouched() {
		assert_eq!(truncate_label("Twelve chars"), "Twelve chars");
		assert_eq!(truncate_label(""), "");
	}

	#[test]
	fn truncation_counts_characters_not_bytes() {
		assert_eq!(truncate_label("知识图谱可视化系统的节点名称"), "知识图谱可视化系统的...");
	}

	#[test]
	fn unknown_type_uses_fallback() {
		assert_eq!(StyleTable::EXPLORER.lookup("Professor").radius, 20.0);
		assert_eq!(StyleTable::EXPLORER.lookup("Spaceship"), style(15.0, "#999999"));
		assert_eq!(StyleTable::EXTRACTION.color("Person"), "#1f77b4");
	}

	#[test]
	fn edge_width_is_bounded() {
		assert_eq!(edge_width(None), 1.5);
		assert_eq!(edge_width(Some(0.2)), 1.0);
		assert_eq!(edge_width(Some(9.0)), 5.0);
	}
}
