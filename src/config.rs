//! Runtime configuration: API location and layout/zoom constants.

use log::warn;
use serde::Deserialize;

/// Id of the optional `<script type="application/json">` element holding an [`AppConfig`].
pub const CONFIG_ELEMENT_ID: &str = "kg-config";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
	/// Prefix prepended to every API path. Empty means same origin.
	pub api_base: String,
	pub explorer: GraphConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base: String::new(),
			explorer: GraphConfig::explorer(),
		}
	}
}

impl AppConfig {
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Reads the config element from the current document, falling back to defaults.
	pub fn from_document() -> Self {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		let Some(text) = text else {
			return Self::default();
		};
		match Self::from_json(&text) {
			Ok(config) => config,
			Err(err) => {
				warn!("ignoring malformed #{CONFIG_ELEMENT_ID}: {err}");
				Self::default()
			}
		}
	}
}

/// Physics and viewport constants for one graph canvas.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
	pub link_distance: f64,
	pub charge_strength: f64,
	pub center_strength: f64,
	pub collision_radius: f64,
	/// Pull toward the center along each axis, applied to velocities.
	pub position_strength: Option<f64>,
	/// Keeps nodes this far inside the viewport edges.
	pub clamp_margin: Option<f64>,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	pub velocity_decay: f64,
	/// Alpha target while a node is being dragged.
	pub drag_alpha_target: f64,
	pub zoom_min: f64,
	pub zoom_max: f64,
	/// How long a focused node stays pinned at the center after a load.
	pub focus_pin_ms: u32,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self::explorer()
	}
}

impl GraphConfig {
	pub fn explorer() -> Self {
		Self {
			link_distance: 150.0,
			charge_strength: -400.0,
			center_strength: 0.1,
			collision_radius: 22.5,
			position_strength: None,
			clamp_margin: None,
			alpha_decay: 0.02,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			zoom_min: 0.2,
			zoom_max: 5.0,
			focus_pin_ms: 2000,
		}
	}

	pub fn extraction() -> Self {
		Self {
			link_distance: 100.0,
			charge_strength: -300.0,
			center_strength: 1.0,
			collision_radius: 50.0,
			position_strength: Some(0.1),
			clamp_margin: Some(50.0),
			alpha_decay: 0.0228,
			zoom_min: 0.3,
			zoom_max: 3.0,
			..Self::explorer()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = AppConfig::from_json(r#"{"api_base":"http://kg.local","explorer":{"link_distance":90}}"#)
			.unwrap();
		assert_eq!(config.api_base, "http://kg.local");
		assert_eq!(config.explorer.link_distance, 90.0);
		assert_eq!(config.explorer.charge_strength, -400.0);
		assert_eq!(config.explorer.zoom_max, 5.0);
	}

	#[test]
	fn extraction_preset_bounds_zoom_tighter() {
		let c = GraphConfig::extraction();
		assert_eq!((c.zoom_min, c.zoom_max), (0.3, 3.0));
		assert_eq!(c.clamp_margin, Some(50.0));
		assert_eq!(c.velocity_decay, GraphConfig::explorer().velocity_decay);
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(AppConfig::from_json("{not json").is_err());
	}
}
