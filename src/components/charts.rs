//! SVG doughnut and bar charts for the statistics page.

use std::f64::consts::{FRAC_PI_2, TAU};

use leptos::prelude::*;

use crate::api::types::TypeCount;
use crate::components::force_graph::StyleTable;

/// Bars shown at most in the relation chart.
pub const BAR_LIMIT: usize = 10;
const BAR_COLOR: &str = "rgba(54, 162, 235, 0.7)";

/// `value` as a whole percentage of `total`, rounded half up.
pub fn percent(value: u64, total: u64) -> u64 {
	if total == 0 {
		return 0;
	}
	(value * 100 + total / 2) / total
}

/// Decimal with thousands separators: `1234567` → `1,234,567`.
pub fn format_count(n: u64) -> String {
	let digits = n.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}
	out
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
	pub label: String,
	pub count: u64,
	pub percent: u64,
	pub color: &'static str,
	/// SVG path of the ring segment.
	pub path: String,
}

fn polar(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
	(cx + r * angle.cos(), cy + r * angle.sin())
}

fn ring_segment(cx: f64, cy: f64, outer: f64, inner: f64, from: f64, to: f64) -> String {
	// a full circle as one arc has coincident endpoints and draws nothing
	let to = if to - from >= TAU { from + TAU - 1e-4 } else { to };
	let large = if to - from > std::f64::consts::PI { 1 } else { 0 };
	let (x0, y0) = polar(cx, cy, outer, from);
	let (x1, y1) = polar(cx, cy, outer, to);
	let (x2, y2) = polar(cx, cy, inner, to);
	let (x3, y3) = polar(cx, cy, inner, from);
	format!(
		"M {x0:.2} {y0:.2} A {outer} {outer} 0 {large} 1 {x1:.2} {y1:.2} \
		 L {x2:.2} {y2:.2} A {inner} {inner} 0 {large} 0 {x3:.2} {y3:.2} Z"
	)
}

/// Segments clockwise from twelve o'clock. Zero counts get no segment.
pub fn doughnut(items: &[TypeCount], styles: &StyleTable, size: f64) -> Vec<Slice> {
	let total: u64 = items.iter().map(|t| t.count).sum();
	if total == 0 {
		return Vec::new();
	}
	let c = size / 2.0;
	let (outer, inner) = (c * 0.95, c * 0.55);
	let mut angle = -FRAC_PI_2;
	items
		.iter()
		.filter(|t| t.count > 0)
		.map(|t| {
			let sweep = TAU * t.count as f64 / total as f64;
			let path = ring_segment(c, c, outer, inner, angle, angle + sweep);
			angle += sweep;
			Slice {
				label: t.type_name.clone(),
				count: t.count,
				percent: percent(t.count, total),
				color: styles.color(&t.type_name),
				path,
			}
		})
		.collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
	pub label: String,
	pub count: u64,
	/// Share of the tallest bar, 0..=1.
	pub height: f64,
}

/// First [`BAR_LIMIT`] entries in server order, scaled to the largest.
pub fn bars(items: &[TypeCount]) -> Vec<Bar> {
	let top = &items[..items.len().min(BAR_LIMIT)];
	let max = top.iter().map(|t| t.count).max().unwrap_or(0);
	top.iter()
		.map(|t| Bar {
			label: t.type_name.clone(),
			count: t.count,
			height: if max == 0 { 0.0 } else { t.count as f64 / max as f64 },
		})
		.collect()
}

#[component]
fn EmptyChart(message: &'static str) -> impl IntoView {
	view! { <div class="chart-empty">{message}</div> }
}

#[component]
pub fn DoughnutChart(#[prop(into)] items: Signal<Vec<TypeCount>>, #[prop(default = 240.0)] size: f64) -> impl IntoView {
	move || {
		let slices = doughnut(&items.get(), &StyleTable::EXPLORER, size);
		if slices.is_empty() {
			return view! { <EmptyChart message="No node type data" /> }.into_any();
		}
		let legend = slices.clone();
		view! {
			<div class="chart doughnut">
				<svg width=size height=size viewBox=format!("0 0 {size} {size}")>
					{slices
						.into_iter()
						.map(|s| {
							view! {
								<path d=s.path fill=s.color stroke="#ffffff" stroke-width="1">
									<title>{format!("{}: {} ({}%)", s.label, format_count(s.count), s.percent)}</title>
								</path>
							}
						})
						.collect_view()}
				</svg>
				<ul class="chart-legend">
					{legend
						.into_iter()
						.map(|s| {
							view! {
								<li>
									<span class="swatch" style=format!("background:{}", s.color)></span>
									{format!("{} ({}%)", s.label, s.percent)}
								</li>
							}
						})
						.collect_view()}
				</ul>
			</div>
		}
		.into_any()
	}
}

#[component]
pub fn BarChart(
	#[prop(into)] items: Signal<Vec<TypeCount>>,
	#[prop(default = 480.0)] width: f64,
	#[prop(default = 240.0)] height: f64,
) -> impl IntoView {
	move || {
		let bars = bars(&items.get());
		if bars.is_empty() {
			return view! { <EmptyChart message="No relation type data" /> }.into_any();
		}
		let label_h = 40.0;
		let plot_h = height - label_h;
		let slot = width / bars.len() as f64;
		let bar_w = slot * 0.7;
		view! {
			<div class="chart bar">
				<svg width=width height=height viewBox=format!("0 0 {width} {height}")>
					{bars
						.into_iter()
						.enumerate()
						.map(|(i, b)| {
							let h = (b.height * (plot_h - 16.0)).max(1.0);
							let x = i as f64 * slot + (slot - bar_w) / 2.0;
							let y = plot_h - h;
							view! {
								<g>
									<rect x=x y=y width=bar_w height=h fill=BAR_COLOR>
										<title>{format!("{}: {}", b.label, format_count(b.count))}</title>
									</rect>
									<text x={x + bar_w / 2.0} y={y - 4.0} text-anchor="middle" font-size="11">
										{format_count(b.count)}
									</text>
									<text
										x={x + bar_w / 2.0}
										y={plot_h + 14.0}
										text-anchor="middle"
										font-size="11"
										fill="#6c757d"
									>
										{b.label}
									</text>
								</g>
							}
						})
						.collect_view()}
				</svg>
			</div>
		}
		.into_any()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tc(name: &str, count: u64) -> TypeCount {
		TypeCount {
			type_name: name.into(),
			count,
		}
	}

	#[test]
	fn thousands_are_grouped() {
		assert_eq!(format_count(0), "0");
		assert_eq!(format_count(999), "999");
		assert_eq!(format_count(1000), "1,000");
		assert_eq!(format_count(1234567), "1,234,567");
	}

	#[test]
	fn percentages_round_half_up() {
		assert_eq!(percent(1, 3), 33);
		assert_eq!(percent(2, 3), 67);
		assert_eq!(percent(1, 8), 13);
		assert_eq!(percent(5, 0), 0);
	}

	#[test]
	fn doughnut_skips_zero_and_colors_by_type() {
		let slices = doughnut(&[tc("Professor", 3), tc("Ghost", 0), tc("Paper", 1)], &StyleTable::EXPLORER, 200.0);
		assert_eq!(slices.len(), 2);
		assert_eq!(slices[0].percent, 75);
		assert_eq!(slices[0].color, "#e41a1c");
		assert!(slices[0].path.starts_with("M 100.00 5.00"));
		assert!(doughnut(&[tc("Paper", 0)], &StyleTable::EXPLORER, 200.0).is_empty());
	}

	#[test]
	fn single_type_still_draws_a_ring() {
		let slices = doughnut(&[tc("Paper", 4)], &StyleTable::EXPLORER, 100.0);
		assert_eq!(slices[0].percent, 100);
		assert!(slices[0].path.contains(" 1 1 "));
	}

	#[test]
	fn bars_keep_the_first_ten_scaled_to_max() {
		let items: Vec<TypeCount> = (1..=12).map(|i| tc(&format!("R{i}"), i)).collect();
		let bars = bars(&items);
		assert_eq!(bars.len(), BAR_LIMIT);
		assert_eq!(bars[9].label, "R10");
		assert_eq!(bars[9].height, 1.0);
		assert_eq!(bars[4].height, 0.5);
		assert!(super::bars(&[]).is_empty());
	}
}
