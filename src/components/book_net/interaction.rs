//! Pointer handling for the book network.
//!
//! The renderer resolves every pointer position to a typed [`Hit`] and the
//! controller turns presses, moves and releases into gestures. A press only
//! becomes a click when the pointer is released within [`CLICK_SLOP`] of
//! where it went down; otherwise it becomes a node drag or a pan.

use std::mem;

use super::mode::EditMode;
use super::scene::{
	ADD_REFERENCE_RADIUS, ANCHOR_RADIUS, LINK_WIDTH, PanelAction, Rect, add_page_bounds,
	add_reference_center, delete_glyph, segment_distance,
};
use super::state::Stage;
use super::types::{BookNetEvent, LinkChange, PageLink};

/// How close a link-drawing release must land to a target anchor.
pub const PICK_RADIUS: f64 = 10.0;
/// Screen pixels a press may travel and still count as a click.
pub const CLICK_SLOP: f64 = 3.0;
/// Extra reach around a link's stroke when picking it.
pub const LINK_PICK_SLACK: f64 = 3.0;

/// What sits under the pointer, topmost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
	Background,
	Node(usize),
	Anchor(usize),
	Link(usize),
	DeleteGlyph,
	Panel(usize, PanelAction),
	AddPage,
	AddReference,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	/// Pointer is down but has not moved far enough to drag.
	Pressed { hit: Hit, start: (f64, f64) },
	DraggingNode { node: usize, grab: (f64, f64) },
	Panning { start: (f64, f64), origin: (f64, f64) },
	/// Preview line from `source`'s anchor to the pointer, in graph space.
	DrawingLink {
		source: usize,
		from: (f64, f64),
		to: (f64, f64),
	},
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hover {
	pub node: Option<usize>,
	pub anchor: Option<usize>,
	pub link: Option<usize>,
	pub delete_glyph: bool,
	pub add_page: bool,
	pub add_reference: bool,
}

impl Hover {
	fn from_hit(hit: Hit) -> Self {
		let mut hover = Hover::default();
		match hit {
			Hit::Node(i) => hover.node = Some(i),
			Hit::Anchor(i) => {
				hover.anchor = Some(i);
				hover.node = Some(i);
			}
			Hit::Link(i) => hover.link = Some(i),
			Hit::DeleteGlyph => hover.delete_glyph = true,
			Hit::Panel(i, _) => hover.node = Some(i),
			Hit::AddPage => hover.add_page = true,
			Hit::AddReference => hover.add_reference = true,
			Hit::Background => {}
		}
		hover
	}
}

/// Returns the link list with `a`-`b` appended, or `None` when the link
/// would be a self-loop or duplicates an existing edge in either direction.
pub fn add_link(links: &[PageLink], a: &str, b: &str) -> Option<Vec<PageLink>> {
	if a == b || links.iter().any(|link| link.connects(a, b)) {
		return None;
	}
	let mut next = links.to_vec();
	next.push(PageLink::new(a, b));
	Some(next)
}

pub fn remove_link(links: &[PageLink], idx: usize) -> Vec<PageLink> {
	links
		.iter()
		.enumerate()
		.filter(|(i, _)| *i != idx)
		.map(|(_, link)| link.clone())
		.collect()
}

pub struct Controller {
	mode: EditMode,
	links: Vec<PageLink>,
	gesture: Gesture,
	/// Node whose action panel is open.
	selected: Option<usize>,
	/// Link showing its delete glyph.
	active_link: Option<usize>,
	hover: Hover,
}

impl Controller {
	pub fn new(mode: EditMode, links: Vec<PageLink>) -> Self {
		Self {
			mode,
			links,
			gesture: Gesture::Idle,
			selected: None,
			active_link: None,
			hover: Hover::default(),
		}
	}

	pub fn mode(&self) -> EditMode {
		self.mode
	}

	pub fn links(&self) -> &[PageLink] {
		&self.links
	}

	#[cfg(test)]
	pub fn gesture(&self) -> &Gesture {
		&self.gesture
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn active_link(&self) -> Option<usize> {
		self.active_link
	}

	pub fn hover(&self) -> Hover {
		self.hover
	}

	pub fn preview_line(&self) -> Option<((f64, f64), (f64, f64))> {
		match self.gesture {
			Gesture::DrawingLink { from, to, .. } => Some((from, to)),
			_ => None,
		}
	}

	pub fn hit_test(&self, stage: &Stage, sx: f64, sy: f64) -> Hit {
		if self.mode.is_editing() {
			if add_page_bounds(stage.width).contains(sx, sy) {
				return Hit::AddPage;
			}
			let (cx, cy) = add_reference_center(stage.width);
			if ((sx - cx).powi(2) + (sy - cy).powi(2)).sqrt() <= ADD_REFERENCE_RADIUS {
				return Hit::AddReference;
			}
		}

		let (gx, gy) = stage.screen_to_graph(sx, sy);

		if let Some(glyph) = self.active_link.and_then(|i| self.glyph_for(stage, i)) {
			if glyph.contains(gx, gy) {
				return Hit::DeleteGlyph;
			}
		}

		if let Some(idx) = self.selected {
			let (x, y) = stage.position(idx);
			let card = &stage.cards[idx];
			for action in PanelAction::ALL {
				if card.panel_button(x, y, action).contains(gx, gy) {
					return Hit::Panel(idx, action);
				}
			}
		}

		if self.mode == EditMode::LinkEdit {
			if let Some(idx) = stage.anchor_near(gx, gy, ANCHOR_RADIUS, None) {
				return Hit::Anchor(idx);
			}
		}

		if let Some(idx) = stage.node_at(gx, gy) {
			return Hit::Node(idx);
		}

		let reach = LINK_WIDTH / 2.0 + LINK_PICK_SLACK;
		for (idx, link) in self.links.iter().enumerate().rev() {
			if let Some((a, b)) = stage.link_endpoints(link) {
				if segment_distance((gx, gy), a, b) <= reach {
					return Hit::Link(idx);
				}
			}
		}

		Hit::Background
	}

	fn glyph_for(&self, stage: &Stage, link: usize) -> Option<Rect> {
		let (a, b) = stage.link_endpoints(self.links.get(link)?)?;
		Some(delete_glyph(a, b))
	}

	pub fn pointer_down(&mut self, stage: &mut Stage, sx: f64, sy: f64) {
		let hit = self.hit_test(stage, sx, sy);

		if self.mode == EditMode::LinkEdit && hit != Hit::DeleteGlyph {
			self.active_link = None;
		}

		self.gesture = match hit {
			Hit::Anchor(source) if self.mode == EditMode::LinkEdit => {
				let (x, y) = stage.position(source);
				Gesture::DrawingLink {
					source,
					from: stage.cards[source].anchor(x, y),
					to: stage.screen_to_graph(sx, sy),
				}
			}
			hit => Gesture::Pressed {
				hit,
				start: (sx, sy),
			},
		};
	}

	pub fn pointer_move(&mut self, stage: &mut Stage, sx: f64, sy: f64) {
		match self.gesture {
			Gesture::Idle => {
				self.hover = Hover::from_hit(self.hit_test(stage, sx, sy));
			}
			Gesture::Pressed { hit, start } => {
				let travelled = ((sx - start.0).powi(2) + (sy - start.1).powi(2)).sqrt();
				if travelled <= CLICK_SLOP {
					return;
				}
				self.gesture = match hit {
					Hit::Node(node) => {
						let (px, py) = stage.screen_to_graph(start.0, start.1);
						let (nx, ny) = stage.position(node);
						let energy = stage.sim.params().drag_alpha_target;
						stage.sim.reheat(energy);
						Gesture::DraggingNode {
							node,
							grab: (nx - px, ny - py),
						}
					}
					_ => Gesture::Panning {
						start,
						origin: (stage.transform.x, stage.transform.y),
					},
				};
				self.pointer_move(stage, sx, sy);
			}
			Gesture::DraggingNode { node, grab } => {
				let (gx, gy) = stage.screen_to_graph(sx, sy);
				stage.sim.pin(node, gx + grab.0, gy + grab.1);
			}
			Gesture::Panning { start, origin } => {
				stage.transform.x = origin.0 + (sx - start.0);
				stage.transform.y = origin.1 + (sy - start.1);
			}
			Gesture::DrawingLink { source, from, .. } => {
				self.gesture = Gesture::DrawingLink {
					source,
					from,
					to: stage.screen_to_graph(sx, sy),
				};
			}
		}
	}

	pub fn pointer_up(&mut self, stage: &mut Stage, sx: f64, sy: f64) -> Vec<BookNetEvent> {
		match mem::take(&mut self.gesture) {
			Gesture::Idle | Gesture::Panning { .. } => Vec::new(),
			Gesture::Pressed { hit, .. } => self.click(stage, hit),
			Gesture::DraggingNode { node, .. } => {
				release_node(stage, node);
				Vec::new()
			}
			Gesture::DrawingLink { source, .. } => {
				let (gx, gy) = stage.screen_to_graph(sx, sy);
				stage
					.anchor_near(gx, gy, PICK_RADIUS, Some(source))
					.and_then(|target| self.connect(stage, source, target))
					.into_iter()
					.collect()
			}
		}
	}

	/// Pointer left the canvas: abandon whatever gesture was in flight.
	pub fn pointer_leave(&mut self, stage: &mut Stage) {
		if let Gesture::DraggingNode { node, .. } = mem::take(&mut self.gesture) {
			release_node(stage, node);
		}
		self.hover = Hover::default();
	}

	pub fn wheel(&mut self, stage: &mut Stage, sx: f64, sy: f64, delta_y: f64) {
		if matches!(self.gesture, Gesture::DrawingLink { .. }) {
			return;
		}
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		stage.zoom_at(sx, sy, factor);
	}

	fn click(&mut self, stage: &mut Stage, hit: Hit) -> Vec<BookNetEvent> {
		match (self.mode, hit) {
			(_, Hit::AddPage) => {
				self.selected = None;
				vec![BookNetEvent::AddPage]
			}
			(_, Hit::AddReference) => {
				self.selected = None;
				vec![BookNetEvent::AddReference]
			}
			(EditMode::Viewing, Hit::Node(idx)) => vec![open_event(stage, idx)],
			(EditMode::Viewing, _) => Vec::new(),

			(EditMode::NodeEdit, Hit::Node(idx)) => {
				if self.selected == Some(idx) {
					self.selected = None;
				} else {
					self.selected = Some(idx);
					stage.raise(idx);
				}
				Vec::new()
			}
			(EditMode::NodeEdit, Hit::Panel(idx, action)) => {
				let id = stage.cards[idx].id.clone();
				let event = match action {
					PanelAction::Open => open_event(stage, idx),
					PanelAction::Edit => BookNetEvent::EditPage(id),
					PanelAction::Delete => BookNetEvent::DeletePage(id),
				};
				vec![event]
			}
			(EditMode::NodeEdit, _) => {
				self.selected = None;
				Vec::new()
			}

			(EditMode::LinkEdit, Hit::Link(idx)) => {
				self.active_link = Some(idx);
				Vec::new()
			}
			(EditMode::LinkEdit, Hit::DeleteGlyph) => self
				.active_link
				.take()
				.map(|idx| self.disconnect(idx))
				.into_iter()
				.collect(),
			(EditMode::LinkEdit, _) => Vec::new(),
		}
	}

	fn connect(&mut self, stage: &Stage, source: usize, target: usize) -> Option<BookNetEvent> {
		let (a, b) = (&stage.cards[source].id, &stage.cards[target].id);
		let links = add_link(&self.links, a, b)?;
		log::info!("linking {a} -> {b}");
		self.links = links.clone();
		Some(BookNetEvent::SaveLinks {
			links,
			change: LinkChange::Added,
		})
	}

	fn disconnect(&mut self, idx: usize) -> BookNetEvent {
		let links = remove_link(&self.links, idx);
		log::info!("removing link {idx}");
		self.links = links.clone();
		self.hover.link = None;
		BookNetEvent::SaveLinks {
			links,
			change: LinkChange::Deleted,
		}
	}
}

fn release_node(stage: &mut Stage, node: usize) {
	stage.sim.set_alpha_target(0.0);
	stage.sim.unpin(node);
}

fn open_event(stage: &Stage, idx: usize) -> BookNetEvent {
	let card = &stage.cards[idx];
	match &card.ref_url {
		Some(url) => BookNetEvent::OpenReference(url.clone()),
		None => BookNetEvent::OpenPage(card.id.clone()),
	}
}
