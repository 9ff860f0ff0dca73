//! Static visual content for a built book network: per-node cards with their
//! wrapped text, the empty-state message, and the geometry shared by drawing
//! and hit-testing. Positions come from the layout each frame; nothing here
//! changes after a build.

use chrono::{DateTime, Utc};

use super::mode::EditMode;
use super::types::{NODE_HEIGHT, NODE_WIDTH, PageNode};
use super::wrap::{MeasureText, TextBox, WrapMode, wrap_text};

pub const CORNER_RADIUS: f64 = 5.0;
pub const TITLE_FONT: f64 = 15.0;
pub const BODY_FONT: f64 = 10.0;
pub const ANCHOR_RADIUS: f64 = 10.0;
pub const LINK_WIDTH: f64 = 5.0;
pub const LINK_HOVER_WIDTH: f64 = 10.0;
pub const DELETE_GLYPH_SIZE: f64 = 20.0;
pub const PANEL_WIDTH: f64 = 50.0;
pub const PANEL_BUTTON_HEIGHT: f64 = 40.0;
pub const HOVER_SCALE: f64 = 1.2;

/// Screen-space centres of the floating add affordances, measured from the
/// right edge of the canvas.
pub const ADD_PAGE_OFFSET: (f64, f64) = (130.0, 70.0);
pub const ADD_REFERENCE_OFFSET: (f64, f64) = (130.0, 190.0);
pub const ADD_PAGE_SIZE: (f64, f64) = (200.0, 100.0);
pub const ADD_REFERENCE_RADIUS: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
	}
}

/// Actions offered by the node-edit panel, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
	Open,
	Edit,
	Delete,
}

impl PanelAction {
	pub const ALL: [PanelAction; 3] = [PanelAction::Open, PanelAction::Edit, PanelAction::Delete];

	pub fn label(self) -> &'static str {
		match self {
			PanelAction::Open => "Open",
			PanelAction::Edit => "Edit",
			PanelAction::Delete => "Delete",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeCard {
	pub id: String,
	pub title: Vec<String>,
	pub description: Vec<String>,
	pub footer: String,
	pub ref_url: Option<String>,
	pub cover: bool,
	pub width: f64,
	pub height: f64,
}

impl NodeCard {
	pub fn build(node: &PageNode, now: DateTime<Utc>, measure: &impl MeasureText) -> Self {
		let (width, height) = (NODE_WIDTH, NODE_HEIGHT);
		Self {
			id: node.id.clone(),
			title: wrap_text(&node.name, title_box(width, height), WrapMode::Chars, measure),
			description: wrap_text(
				&node.short_desc,
				description_box(width, height),
				WrapMode::Words,
				measure,
			),
			footer: format!("Last updated {}", time_ago(node.updated_on, now)),
			ref_url: node.ref_url.clone(),
			cover: node.cover.is_some(),
			width,
			height,
		}
	}

	pub fn is_reference(&self) -> bool {
		self.ref_url.is_some()
	}

	/// Box around a node centred at `(x, y)`.
	pub fn bounds(&self, x: f64, y: f64) -> Rect {
		Rect {
			x: x - self.width / 2.0,
			y: y - self.height / 2.0,
			width: self.width,
			height: self.height,
		}
	}

	/// Link-edit anchor at the top-left corner.
	pub fn anchor(&self, x: f64, y: f64) -> (f64, f64) {
		(x - self.width / 2.0 - 2.0, y - self.height / 2.0 - 2.0)
	}

	/// Divider heights, relative to the node centre.
	pub fn dividers(&self) -> [f64; 2] {
		[
			-self.height / 2.0 + self.height / 5.0,
			self.height / 2.0 - 20.0,
		]
	}

	pub fn title_origin(&self) -> (f64, f64) {
		(-self.width / 2.0 + 5.0, -self.height / 2.0 + 20.0)
	}

	pub fn description_origin(&self) -> (f64, f64) {
		(-self.width / 2.0 + 10.0, -self.height / 2.0 + 40.0)
	}

	pub fn footer_origin(&self) -> (f64, f64) {
		(-self.width / 2.0 + 5.0, self.height / 2.0 - 8.0)
	}

	/// Contextual panel, anchored off the top-right corner.
	pub fn panel(&self, x: f64, y: f64) -> Rect {
		Rect {
			x: x + self.width / 2.0 + 20.0,
			y: y - self.height / 2.0 - 25.0,
			width: PANEL_WIDTH,
			height: PANEL_BUTTON_HEIGHT * PanelAction::ALL.len() as f64,
		}
	}

	pub fn panel_button(&self, x: f64, y: f64, action: PanelAction) -> Rect {
		let panel = self.panel(x, y);
		let row = PanelAction::ALL.iter().position(|a| *a == action).unwrap_or(0);
		Rect {
			y: panel.y + row as f64 * PANEL_BUTTON_HEIGHT,
			height: PANEL_BUTTON_HEIGHT,
			..panel
		}
	}
}

fn title_box(width: f64, height: f64) -> TextBox {
	TextBox {
		width: width - 10.0,
		height: height / 4.0 - 30.0,
		font_size: TITLE_FONT,
	}
}

fn description_box(width: f64, height: f64) -> TextBox {
	TextBox {
		width: width - 20.0,
		height: 3.0 * height / 4.0 - 30.0,
		font_size: BODY_FONT,
	}
}

/// Delete glyph beside the midpoint of an activated link.
pub fn delete_glyph(source: (f64, f64), target: (f64, f64)) -> Rect {
	Rect {
		x: (source.0 + target.0) / 2.0 + 20.0,
		y: (source.1 + target.1) / 2.0 - 20.0,
		width: DELETE_GLYPH_SIZE,
		height: DELETE_GLYPH_SIZE,
	}
}

pub fn add_page_bounds(canvas_width: f64) -> Rect {
	let (cx, cy) = (canvas_width - ADD_PAGE_OFFSET.0, ADD_PAGE_OFFSET.1);
	Rect {
		x: cx - ADD_PAGE_SIZE.0 / 2.0,
		y: cy - ADD_PAGE_SIZE.1 / 2.0,
		width: ADD_PAGE_SIZE.0,
		height: ADD_PAGE_SIZE.1,
	}
}

pub fn add_reference_center(canvas_width: f64) -> (f64, f64) {
	(canvas_width - ADD_REFERENCE_OFFSET.0, ADD_REFERENCE_OFFSET.1)
}

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyState {
	pub headline: &'static str,
	pub hint: &'static str,
}

impl EmptyState {
	pub fn new(signed_in: bool, mode: EditMode) -> Self {
		let hint = if !signed_in {
			"Please sign in to create new page."
		} else if mode.is_editing() {
			"Click on the '+' sign (top right) to create new page."
		} else {
			"Click on the node setting to enable add option."
		};
		Self {
			headline: "No Page Available!",
			hint,
		}
	}
}

/// Scale applied to a card around its centre. Link editing keeps cards still
/// so anchors stay where the pointer expects them.
pub fn card_scale(hovered: bool, mode: EditMode) -> f64 {
	if hovered && mode != EditMode::LinkEdit { HOVER_SCALE } else { 1.0 }
}

/// Coarse "time ago" wording for node footers.
pub fn time_ago(updated: DateTime<Utc>, now: DateTime<Utc>) -> String {
	fn plural(n: i64, unit: &str) -> String {
		if n == 1 {
			format!("{n} {unit} ago")
		} else {
			format!("{n} {unit}s ago")
		}
	}

	let minutes = (now - updated).num_seconds().div_euclid(60);
	if minutes <= 1 {
		return "now".into();
	}
	let hours = minutes / 60;
	if hours < 1 {
		return format!("{minutes} mins ago");
	}
	let days = hours / 24;
	if days < 1 {
		return plural(hours, "hour");
	}
	let months = days / 30;
	if months < 1 {
		return plural(days, "day");
	}
	let years = months / 12;
	if years < 1 {
		return plural(months, "month");
	}
	plural(years, "year")
}
