use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use super::interaction::Controller;
use super::layout::{LayoutParams, Simulation};
use super::mode::EditMode;
use super::scene::{EmptyState, NodeCard};
use super::types::{BookNetData, BookNetEvent, PageLink};
use super::wrap::MeasureText;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Everything positioned on the canvas: the layout, the per-node cards and
/// the pan/zoom transform.
pub struct Stage {
	pub sim: Simulation,
	pub cards: Vec<NodeCard>,
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	/// Node indices back to front.
	pub draw_order: Vec<usize>,
}

impl Stage {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	#[cfg(test)]
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	pub fn position(&self, idx: usize) -> (f64, f64) {
		self.sim
			.node(idx)
			.map(|n| (n.x, n.y))
			.unwrap_or((self.width / 2.0, self.height / 2.0))
	}

	/// Topmost node whose box contains the point.
	pub fn node_at(&self, gx: f64, gy: f64) -> Option<usize> {
		self.draw_order.iter().rev().copied().find(|&idx| {
			let (x, y) = self.position(idx);
			self.cards[idx].bounds(x, y).contains(gx, gy)
		})
	}

	/// Topmost node whose anchor lies within `radius` of the point, never
	/// `except`.
	pub fn anchor_near(
		&self,
		gx: f64,
		gy: f64,
		radius: f64,
		except: Option<usize>,
	) -> Option<usize> {
		self.draw_order.iter().rev().copied().find(|&idx| {
			if except == Some(idx) {
				return false;
			}
			let (x, y) = self.position(idx);
			let (ax, ay) = self.cards[idx].anchor(x, y);
			((gx - ax).powi(2) + (gy - ay).powi(2)).sqrt() <= radius
		})
	}

	pub fn link_endpoints(&self, link: &PageLink) -> Option<((f64, f64), (f64, f64))> {
		let source = self.sim.position(&link.source)?;
		let target = self.sim.position(&link.target)?;
		Some((source, target))
	}

	/// Moves a node to the front of the draw order.
	pub fn raise(&mut self, idx: usize) {
		self.draw_order.retain(|&i| i != idx);
		self.draw_order.push(idx);
	}

	/// Zooms by `factor` keeping the graph point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}
}

/// One built book network view. Rebuilt from scratch whenever the data,
/// the edit mode, the session or the viewport changes.
pub struct BookNetState {
	pub stage: Stage,
	pub controller: Controller,
	pub signed_in: bool,
	pub empty: Option<EmptyState>,
	dirty: Rc<Cell<bool>>,
}

impl BookNetState {
	pub fn new(
		data: &BookNetData,
		mode: EditMode,
		signed_in: bool,
		width: f64,
		height: f64,
		now: DateTime<Utc>,
		measure: &impl MeasureText,
	) -> Self {
		let mode = mode.effective(signed_in);
		// The layout owns positions; the caller's data is only read.
		let nodes = data.nodes.clone();
		let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		// Links to missing pages are never drawn, so they must not be saved back either.
		let (links, stale): (Vec<PageLink>, Vec<PageLink>) =
			data.links.iter().cloned().partition(|l| {
				l.source != l.target
					&& ids.contains(l.source.as_str())
					&& ids.contains(l.target.as_str())
			});
		if !stale.is_empty() {
			log::debug!("dropping {} stale links", stale.len());
		}

		let mut sim = Simulation::new(&nodes, &links, width, height, LayoutParams::default());
		let cards: Vec<NodeCard> = nodes
			.iter()
			.map(|node| NodeCard::build(node, now, measure))
			.collect();
		let empty = nodes.is_empty().then(|| EmptyState::new(signed_in, mode));

		let dirty = Rc::new(Cell::new(true));
		let on_tick = dirty.clone();
		sim.on_tick(move |_| on_tick.set(true));

		log::debug!(
			"built book net: {} nodes, {} links, {:?}, {}x{}",
			cards.len(),
			links.len(),
			mode,
			width,
			height
		);

		Self {
			stage: Stage {
				sim,
				draw_order: (0..cards.len()).collect(),
				cards,
				transform: ViewTransform::default(),
				width,
				height,
			},
			controller: Controller::new(mode, links),
			signed_in,
			empty,
			dirty,
		}
	}

	pub fn mode(&self) -> EditMode {
		self.controller.mode()
	}

	/// Advances the layout one frame. Returns whether a repaint is due.
	pub fn tick(&mut self) -> bool {
		self.stage.sim.step();
		self.dirty.replace(false)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.controller.pointer_down(&mut self.stage, sx, sy);
		self.dirty.set(true);
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		self.controller.pointer_move(&mut self.stage, sx, sy);
		self.dirty.set(true);
	}

	pub fn pointer_up(&mut self, sx: f64, sy: f64) -> Vec<BookNetEvent> {
		self.dirty.set(true);
		self.controller.pointer_up(&mut self.stage, sx, sy)
	}

	pub fn pointer_leave(&mut self) {
		self.controller.pointer_leave(&mut self.stage);
		self.dirty.set(true);
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.controller.wheel(&mut self.stage, sx, sy, delta_y);
		self.dirty.set(true);
	}

	/// Stops the layout; no tick callbacks fire afterwards.
	pub fn dispose(&mut self) {
		self.stage.sim.stop();
	}
}

#[cfg(test)]
mod tests {
	use chrono::Duration;
	use proptest::prelude::*;

	use super::*;
	use crate::components::book_net::interaction::{Gesture, Hit, PICK_RADIUS};
	use crate::components::book_net::scene::PanelAction;
	use crate::components::book_net::types::{LinkChange, PageNode};
	use crate::store::{BookStore, MemoryBookStore};

	fn mono(text: &str, font_size: f64) -> f64 {
		text.chars().count() as f64 * font_size * 0.5
	}

	fn page(id: &str) -> PageNode {
		PageNode {
			id: id.into(),
			name: format!("Page {id}"),
			short_desc: "Some words about this page".into(),
			updated_on: Utc::now() - Duration::days(2),
			ref_url: None,
			cover: None,
		}
	}

	fn build(nodes: Vec<PageNode>, links: Vec<PageLink>, mode: EditMode, signed_in: bool) -> BookNetState {
		let data = BookNetData { nodes, links };
		let mut state = BookNetState::new(&data, mode, signed_in, 1200.0, 800.0, Utc::now(), &mono);
		while state.stage.sim.step() {}
		state
	}

	fn anchor_of(state: &BookNetState, id: &str) -> (f64, f64) {
		let idx = state.stage.sim.index_of(id).unwrap();
		let (x, y) = state.stage.position(idx);
		let (ax, ay) = state.stage.cards[idx].anchor(x, y);
		state.stage.graph_to_screen(ax, ay)
	}

	fn centre_of(state: &BookNetState, id: &str) -> (f64, f64) {
		let idx = state.stage.sim.index_of(id).unwrap();
		let (x, y) = state.stage.position(idx);
		state.stage.graph_to_screen(x, y)
	}

	fn click(state: &mut BookNetState, (x, y): (f64, f64)) -> Vec<BookNetEvent> {
		state.pointer_down(x, y);
		state.pointer_up(x, y)
	}

	fn drag(state: &mut BookNetState, from: (f64, f64), to: (f64, f64)) -> Vec<BookNetEvent> {
		state.pointer_down(from.0, from.1);
		state.pointer_move((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
		state.pointer_move(to.0, to.1);
		state.pointer_up(to.0, to.1)
	}

	#[test]
	fn empty_signed_out_view_shows_sign_in_hint() {
		let mut state = build(Vec::new(), Vec::new(), EditMode::Viewing, false);
		let empty = state.empty.clone().unwrap();
		assert_eq!(empty.hint, "Please sign in to create new page.");
		assert!(state.tick());
		click(&mut state, (600.0, 400.0));
	}

	#[test]
	fn caller_data_is_not_touched() {
		let data = BookNetData {
			nodes: vec![page("a"), page("b")],
			links: vec![PageLink::new("a", "b")],
		};
		let before = data.clone();
		let mut state = BookNetState::new(&data, EditMode::LinkEdit, true, 800.0, 600.0, Utc::now(), &mono);
		while state.stage.sim.step() {}
		assert_eq!(data, before);
	}

	#[test]
	fn signed_out_edit_mode_falls_back_to_viewing() {
		let state = build(vec![page("a")], Vec::new(), EditMode::LinkEdit, false);
		assert_eq!(state.mode(), EditMode::Viewing);
	}

	#[test]
	fn viewing_click_navigates() {
		let mut reference = page("r");
		reference.ref_url = Some("/other-book/r".into());
		let mut state = build(vec![page("a"), reference], Vec::new(), EditMode::Viewing, false);

		let a = centre_of(&state, "a");
		assert_eq!(click(&mut state, a), vec![BookNetEvent::OpenPage("a".into())]);
		let r = centre_of(&state, "r");
		assert_eq!(
			click(&mut state, r),
			vec![BookNetEvent::OpenReference("/other-book/r".into())]
		);
	}

	#[test]
	fn drawing_from_anchor_to_anchor_creates_one_link() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
		let from = anchor_of(&state, "a");
		let (bx, by) = anchor_of(&state, "b");

		let events = drag(&mut state, from, (bx + 3.0, by + 4.0));
		assert_eq!(
			events,
			vec![BookNetEvent::SaveLinks {
				links: vec![PageLink::new("a", "b")],
				change: LinkChange::Added,
			}]
		);
		assert_eq!(state.controller.links(), &[PageLink::new("a", "b")]);
		assert_eq!(state.controller.gesture(), &Gesture::Idle);

		// Same pair again, from the other end.
		let from = anchor_of(&state, "b");
		let to = anchor_of(&state, "a");
		assert!(drag(&mut state, from, to).is_empty());
		assert_eq!(state.controller.links().len(), 1);
	}

	#[test]
	fn release_away_from_anchors_adds_nothing() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
		let from = anchor_of(&state, "a");
		let (bx, by) = anchor_of(&state, "b");

		let miss = (bx + PICK_RADIUS + 1.0, by);
		assert!(drag(&mut state, from, miss).is_empty());
		assert!(state.controller.links().is_empty());
		assert!(state.controller.preview_line().is_none());
	}

	#[test]
	fn links_to_missing_pages_are_not_saved_back() {
		let nodes = vec![page("a"), page("b"), page("c")];
		let links = vec![
			PageLink::new("a", "b"),
			PageLink::new("a", "ghost"),
			PageLink::new("c", "c"),
		];
		let store = MemoryBookStore::default();
		store.insert(
			"book",
			BookNetData {
				nodes: nodes.clone(),
				links: links.clone(),
			},
		);
		let mut state = build(nodes, links, EditMode::LinkEdit, true);
		assert_eq!(state.controller.links(), &[PageLink::new("a", "b")]);

		let from = anchor_of(&state, "b");
		let to = anchor_of(&state, "c");
		let events = drag(&mut state, from, to);
		let expected = vec![PageLink::new("a", "b"), PageLink::new("b", "c")];
		assert_eq!(
			events,
			vec![BookNetEvent::SaveLinks {
				links: expected.clone(),
				change: LinkChange::Added,
			}]
		);
		store.save_links("book", &expected).unwrap();
		assert_eq!(store.load_book("book").unwrap().links, expected);
	}

	#[test]
	fn release_near_an_overlapping_anchor_links_to_it() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
		let a_idx = state.stage.sim.index_of("a").unwrap();
		let b_idx = state.stage.sim.index_of("b").unwrap();
		let (x, y) = state.stage.position(a_idx);
		state.stage.sim.pin(b_idx, x + 4.0, y);

		// Within reach of both anchors; the topmost one becomes the source.
		let (ax, ay) = anchor_of(&state, "a");
		state.pointer_down(ax + 2.0, ay);
		state.pointer_move(ax + 40.0, ay + 40.0);
		state.pointer_move(ax, ay);
		let events = state.pointer_up(ax, ay);

		assert_eq!(events.len(), 1);
		assert_eq!(state.controller.links().len(), 1);
		assert!(state.controller.links()[0].connects("a", "b"));
	}

	#[test]
	fn drawing_back_onto_the_source_anchor_is_rejected() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
		let from = anchor_of(&state, "a");
		assert!(drag(&mut state, from, (from.0 + 2.0, from.1 + 2.0)).is_empty());
		assert!(drag(&mut state, from, (from.0 + 40.0, from.1)).is_empty());
		assert!(state.controller.links().is_empty());
	}

	#[test]
	fn pan_and_zoom_are_suppressed_while_drawing() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
		let from = anchor_of(&state, "a");
		state.pointer_down(from.0, from.1);
		state.pointer_move(from.0 + 100.0, from.1 + 100.0);
		state.wheel(from.0, from.1, -1.0);
		assert_eq!(state.stage.transform, ViewTransform::default());
		assert!(state.controller.preview_line().is_some());
		state.pointer_up(from.0 + 100.0, from.1 + 100.0);
	}

	#[test]
	fn clicking_a_link_then_its_glyph_deletes_it() {
		let mut state = build(
			vec![page("a"), page("b")],
			vec![PageLink::new("a", "b")],
			EditMode::LinkEdit,
			true,
		);
		let (ax, ay) = centre_of(&state, "a");
		let (bx, by) = centre_of(&state, "b");
		let mid = ((ax + bx) / 2.0, (ay + by) / 2.0);
		assert_eq!(state.controller.hit_test(&state.stage, mid.0, mid.1), Hit::Link(0));

		assert!(click(&mut state, mid).is_empty());
		assert_eq!(state.controller.active_link(), Some(0));

		let glyph = (mid.0 + 30.0, mid.1 - 10.0);
		assert_eq!(state.controller.hit_test(&state.stage, glyph.0, glyph.1), Hit::DeleteGlyph);
		let events = click(&mut state, glyph);
		assert_eq!(
			events,
			vec![BookNetEvent::SaveLinks {
				links: Vec::new(),
				change: LinkChange::Deleted,
			}]
		);
		assert!(state.controller.links().is_empty());
		assert_eq!(state.controller.active_link(), None);
	}

	#[test]
	fn clicking_elsewhere_deactivates_a_link() {
		let mut state = build(
			vec![page("a"), page("b")],
			vec![PageLink::new("a", "b")],
			EditMode::LinkEdit,
			true,
		);
		let (ax, ay) = centre_of(&state, "a");
		let (bx, by) = centre_of(&state, "b");
		click(&mut state, ((ax + bx) / 2.0, (ay + by) / 2.0));
		assert_eq!(state.controller.active_link(), Some(0));

		assert!(click(&mut state, (5.0, 790.0)).is_empty());
		assert_eq!(state.controller.active_link(), None);
		assert_eq!(state.controller.links().len(), 1);
	}

	#[test]
	fn node_edit_panel_toggles_and_dispatches_actions() {
		let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::NodeEdit, true);
		let a = centre_of(&state, "a");
		let b = centre_of(&state, "b");
		let a_idx = state.stage.sim.index_of("a").unwrap();
		let b_idx = state.stage.sim.index_of("b").unwrap();

		assert!(click(&mut state, a).is_empty());
		assert_eq!(state.controller.selected(), Some(a_idx));
		assert_eq!(state.stage.draw_order.last(), Some(&a_idx));

		let (x, y) = state.stage.position(a_idx);
		let edit = state.stage.cards[a_idx].panel_button(x, y, PanelAction::Edit);
		let edit = (edit.x + edit.width / 2.0, edit.y + edit.height / 2.0);
		assert_eq!(click(&mut state, edit), vec![BookNetEvent::EditPage("a".into())]);
		assert_eq!(state.controller.selected(), Some(a_idx));

		// Another node moves the single panel over.
		click(&mut state, b);
		assert_eq!(state.controller.selected(), Some(b_idx));
		assert_eq!(state.stage.draw_order.last(), Some(&b_idx));

		click(&mut state, b);
		assert_eq!(state.controller.selected(), None);

		click(&mut state, a);
		click(&mut state, (5.0, 790.0));
		assert_eq!(state.controller.selected(), None);
	}

	#[test]
	fn add_affordances_only_respond_while_editing() {
		let mut state = build(vec![page("a")], Vec::new(), EditMode::NodeEdit, true);
		assert_eq!(click(&mut state, (1200.0 - 130.0, 70.0)), vec![BookNetEvent::AddPage]);
		assert_eq!(
			click(&mut state, (1200.0 - 130.0, 190.0)),
			vec![BookNetEvent::AddReference]
		);

		let mut state = build(vec![page("a")], Vec::new(), EditMode::Viewing, true);
		assert!(click(&mut state, (1200.0 - 130.0, 70.0)).is_empty());
	}

	#[test]
	fn dragged_node_is_released_back_to_the_layout() {
		let mut state = build(vec![page("a"), page("b")], vec![PageLink::new("a", "b")], EditMode::Viewing, false);
		let a_idx = state.stage.sim.index_of("a").unwrap();
		let from = centre_of(&state, "a");
		let to = (from.0 - 150.0, from.1 - 100.0);

		state.pointer_down(from.0, from.1);
		state.pointer_move(to.0, to.1);
		assert!(state.stage.sim.is_running());
		let node = state.stage.sim.node(a_idx).unwrap();
		assert_eq!((node.fx, node.fy), (Some(to.0), Some(to.1)));
		for _ in 0..20 {
			state.tick();
		}
		assert_eq!(state.stage.position(a_idx), to);

		assert!(state.pointer_up(to.0, to.1).is_empty());
		assert!(state.stage.sim.node(a_idx).unwrap().fx.is_none());
		state.tick();
		assert_ne!(state.stage.position(a_idx), to);
	}

	#[test]
	fn background_drag_pans_and_wheel_zoom_is_clamped() {
		let mut state = build(vec![page("a")], Vec::new(), EditMode::Viewing, false);
		drag(&mut state, (10.0, 790.0), (60.0, 770.0));
		assert_eq!((state.stage.transform.x, state.stage.transform.y), (50.0, -20.0));

		for _ in 0..30 {
			state.wheel(600.0, 400.0, -1.0);
		}
		assert_eq!(state.stage.transform.k, MAX_ZOOM);
		for _ in 0..30 {
			state.wheel(600.0, 400.0, 1.0);
		}
		assert_eq!(state.stage.transform.k, MIN_ZOOM);
	}

	#[test]
	fn dispose_stops_ticking() {
		let data = BookNetData {
			nodes: vec![page("a")],
			links: Vec::new(),
		};
		let mut state = BookNetState::new(&data, EditMode::Viewing, false, 800.0, 600.0, Utc::now(), &mono);
		assert!(state.tick());
		state.dispose();
		assert!(!state.stage.sim.step());
		assert!(!state.tick());
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(64))]

		#[test]
		fn release_links_only_within_pick_radius_of_the_target(dx in -25.0f64..25.0, dy in -25.0f64..25.0) {
			let mut state = build(vec![page("a"), page("b")], Vec::new(), EditMode::LinkEdit, true);
			let from = anchor_of(&state, "a");
			let (bx, by) = anchor_of(&state, "b");
			let release = (bx + dx, by + dy);
			let distance = ((release.0 - bx).powi(2) + (release.1 - by).powi(2)).sqrt();

			let events = drag(&mut state, from, release);
			if distance <= PICK_RADIUS {
				prop_assert_eq!(events.len(), 1);
				prop_assert_eq!(state.controller.links(), &[PageLink::new("a", "b")]);
			} else {
				prop_assert!(events.is_empty());
				prop_assert!(state.controller.links().is_empty());
			}
		}
	}
}
