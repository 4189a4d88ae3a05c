//! View configuration: canvas size, force parameters and palette.
//!
//! Defaults match the controller's stock topology page. A page may embed a
//! partial JSON override; missing keys keep their defaults.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
	pub width: f64,
	pub height: f64,
}

impl Default for ImageConfig {
	fn default() -> Self {
		Self {
			width: 50.0,
			height: 40.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
	pub width: f64,
	pub height: f64,
	/// Rest length of every link spring.
	pub dist: f64,
	/// Node charge; negative repels.
	pub charge: f64,
	pub spring: f64,
	pub gravity: f64,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			width: 1000.0,
			height: 500.0,
			dist: 150.0,
			charge: -500.0,
			spring: 0.05,
			gravity: 0.1,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
	pub background: String,
	pub link: String,
	pub route: String,
	pub alternate_route: String,
	pub switch: String,
	pub host: String,
	pub port: String,
	pub label: String,
}

impl Default for ColorConfig {
	fn default() -> Self {
		Self {
			background: "#ffffff".into(),
			link: "rgb(0,0,139)".into(),
			route: "rgb(255,0,0)".into(),
			alternate_route: "rgb(0,255,0)".into(),
			switch: "#1f77b4".into(),
			host: "#d62728".into(),
			port: "#ffd700".into(),
			label: "#333333".into(),
		}
	}
}

/// Everything the topology page can be tuned with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
	pub image: ImageConfig,
	pub force: ForceConfig,
	pub colors: ColorConfig,
}

impl ViewConfig {
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let config = ViewConfig::from_json(r#"{"force": {"dist": 80}, "colors": {"route": "orange"}}"#)
			.unwrap();
		assert_eq!(config.force.dist, 80.0);
		assert_eq!(config.force.charge, -500.0);
		assert_eq!(config.colors.route, "orange");
		assert_eq!(config.image, ImageConfig::default());
	}

	#[test]
	fn empty_object_is_default() {
		assert_eq!(ViewConfig::from_json("{}").unwrap(), ViewConfig::default());
	}

	#[test]
	fn wrong_types_are_rejected() {
		assert!(ViewConfig::from_json(r#"{"force": {"dist": "far"}}"#).is_err());
	}
}
