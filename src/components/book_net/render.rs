use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::interaction::Hover;
use super::mode::EditMode;
use super::scene::{
	ADD_PAGE_OFFSET, ADD_REFERENCE_RADIUS, ANCHOR_RADIUS, BODY_FONT, CORNER_RADIUS, EmptyState,
	LINK_HOVER_WIDTH, LINK_WIDTH, NodeCard, PanelAction, Rect, TITLE_FONT, add_page_bounds,
	add_reference_center, card_scale, delete_glyph,
};
use super::state::BookNetState;
use super::wrap::MeasureText;

const DOT_SPACING: f64 = 24.0;

fn font(size: f64) -> String {
	format!("{}px sans-serif", size)
}

/// Text measurement backed by the canvas' own font metrics.
pub struct CanvasMeasure<'a>(pub &'a CanvasRenderingContext2d);

impl MeasureText for CanvasMeasure<'_> {
	fn text_width(&self, text: &str, font_size: f64) -> f64 {
		self.0.set_font(&font(font_size));
		self.0.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	}
}

pub fn render(state: &BookNetState, ctx: &CanvasRenderingContext2d) {
	let stage = &state.stage;
	draw_background(ctx, stage.width, stage.height);

	ctx.save();
	let _ = ctx.translate(stage.transform.x, stage.transform.y);
	let _ = ctx.scale(stage.transform.k, stage.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_delete_glyph(state, ctx);
	if let Some((from, to)) = state.controller.preview_line() {
		ctx.set_stroke_style_str("#0077be");
		ctx.set_line_width(3.0);
		ctx.begin_path();
		ctx.move_to(from.0, from.1);
		ctx.line_to(to.0, to.1);
		ctx.stroke();
	}
	ctx.restore();

	if state.signed_in && state.mode().is_editing() {
		draw_add_affordances(ctx, stage.width, state.controller.hover());
	}
	if let Some(empty) = &state.empty {
		draw_empty_state(ctx, empty, stage.width, stage.height);
	}
}

fn draw_background(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str("grey");
	ctx.fill_rect(0.0, 0.0, width, height);

	ctx.set_fill_style_str("black");
	ctx.begin_path();
	let mut y = 0.0;
	while y < height {
		let mut x = 0.0;
		while x < width {
			for (dx, dy) in [(4.0, 4.0), (16.0, 16.0)] {
				ctx.move_to(x + dx + 1.0, y + dy);
				let _ = ctx.arc(x + dx, y + dy, 1.0, 0.0, 2.0 * PI);
			}
			x += DOT_SPACING;
		}
		y += DOT_SPACING;
	}
	ctx.fill();
}

fn draw_links(state: &BookNetState, ctx: &CanvasRenderingContext2d) {
	let hover = state.controller.hover();
	let active = state.controller.active_link();

	for (idx, link) in state.controller.links().iter().enumerate() {
		let Some((a, b)) = state.stage.link_endpoints(link) else {
			continue;
		};
		let emphasised = active == Some(idx) || (active.is_none() && hover.link == Some(idx));
		ctx.set_stroke_style_str(if active == Some(idx) { "#0077be" } else { "#333" });
		ctx.set_line_width(if emphasised { LINK_HOVER_WIDTH } else { LINK_WIDTH });
		ctx.begin_path();
		ctx.move_to(a.0, a.1);
		ctx.line_to(b.0, b.1);
		ctx.stroke();
	}
}

fn draw_nodes(state: &BookNetState, ctx: &CanvasRenderingContext2d) {
	let stage = &state.stage;
	let hover = state.controller.hover();
	let mode = state.mode();

	for &idx in &stage.draw_order {
		let card = &stage.cards[idx];
		let (x, y) = stage.position(idx);
		ctx.save();
		let _ = ctx.translate(x, y);
		let hovered = hover.node == Some(idx);
		let scale = card_scale(hovered, mode);
		let _ = ctx.scale(scale, scale);
		draw_card(ctx, card, hovered);
		ctx.restore();

		if mode == EditMode::LinkEdit {
			draw_anchor(ctx, card.anchor(x, y), hover.anchor == Some(idx));
		}
		if state.controller.selected() == Some(idx) {
			draw_panel(ctx, card, x, y);
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, rect: Rect, r: f64) {
	let Rect {
		x,
		y,
		width: w,
		height: h,
	} = rect;
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

/// Draws a card centred on the current origin.
fn draw_card(ctx: &CanvasRenderingContext2d, card: &NodeCard, hovered: bool) {
	let outline = if hovered { "cyan" } else { "black" };
	rounded_rect(ctx, card.bounds(0.0, 0.0), CORNER_RADIUS);

	ctx.set_shadow_color("rgba(0, 0, 0, 0.5)");
	ctx.set_shadow_blur(5.0);
	ctx.set_shadow_offset_y(5.0);
	ctx.set_fill_style_str(if card.is_reference() { "silver" } else { "white" });
	ctx.fill();
	ctx.set_shadow_color("transparent");
	ctx.set_shadow_blur(0.0);
	ctx.set_shadow_offset_y(0.0);

	ctx.set_stroke_style_str(outline);
	ctx.set_line_width(if card.cover { 5.0 } else { 1.0 });
	ctx.stroke();

	ctx.set_line_width(1.0);
	for divider in card.dividers() {
		ctx.begin_path();
		ctx.move_to(-card.width / 2.0, divider);
		ctx.line_to(card.width / 2.0, divider);
		ctx.stroke();
	}

	ctx.set_fill_style_str("black");
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
	draw_lines(ctx, &card.title, card.title_origin(), TITLE_FONT);
	draw_lines(ctx, &card.description, card.description_origin(), BODY_FONT);
	ctx.set_font(&font(BODY_FONT));
	let (fx, fy) = card.footer_origin();
	let _ = ctx.fill_text(&card.footer, fx, fy);
}

fn draw_lines(ctx: &CanvasRenderingContext2d, lines: &[String], (x, y): (f64, f64), size: f64) {
	ctx.set_font(&font(size));
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x, y + i as f64 * size);
	}
}

fn draw_anchor(ctx: &CanvasRenderingContext2d, (x, y): (f64, f64), hovered: bool) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, ANCHOR_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(if hovered { "#5fdba7" } else { "white" });
	ctx.fill();
	ctx.set_stroke_style_str(if hovered { "black" } else { "gray" });
	ctx.set_line_width(2.0);
	ctx.stroke();
}

fn draw_panel(ctx: &CanvasRenderingContext2d, card: &NodeCard, x: f64, y: f64) {
	rounded_rect(ctx, card.panel(x, y), CORNER_RADIUS);
	ctx.set_fill_style_str("#212529");
	ctx.fill();

	ctx.set_font(&font(11.0));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for action in PanelAction::ALL {
		let button = card.panel_button(x, y, action);
		let colour = match action {
			PanelAction::Open => "white",
			PanelAction::Edit => "#24a0ed",
			PanelAction::Delete => "#ff4d4d",
		};
		ctx.set_fill_style_str(colour);
		let _ = ctx.fill_text(
			action.label(),
			button.x + button.width / 2.0,
			button.y + button.height / 2.0,
		);
	}
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
}

fn draw_delete_glyph(state: &BookNetState, ctx: &CanvasRenderingContext2d) {
	let Some(link) = state
		.controller
		.active_link()
		.and_then(|idx| state.controller.links().get(idx))
	else {
		return;
	};
	let Some((a, b)) = state.stage.link_endpoints(link) else {
		return;
	};
	let glyph = delete_glyph(a, b);
	let colour = if state.controller.hover().delete_glyph {
		"#bd2130"
	} else {
		"#dc3545"
	};

	rounded_rect(ctx, glyph, 3.0);
	ctx.set_fill_style_str(colour);
	ctx.fill();
	ctx.set_stroke_style_str(colour);
	ctx.set_line_width(2.0);
	ctx.stroke();

	let pad = 4.0;
	let (x0, y0) = (glyph.x + pad, glyph.y + pad);
	let (x1, y1) = (glyph.x + glyph.width - pad, glyph.y + glyph.height - pad);
	ctx.set_stroke_style_str("white");
	ctx.begin_path();
	ctx.move_to(x0, y0);
	ctx.line_to(x1, y1);
	ctx.move_to(x0, y1);
	ctx.line_to(x1, y0);
	ctx.stroke();
}

fn draw_plus(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(5.0),
		&JsValue::from_f64(5.0),
	));
	ctx.begin_path();
	let _ = ctx.arc(0.0, 0.0, 25.0, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str("black");
	ctx.set_line_width(2.0);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str("black");
	ctx.set_font("50px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text("+", 0.0, -3.0);
	ctx.set_text_align("left");
	ctx.set_text_baseline("alphabetic");
}

fn draw_add_affordances(ctx: &CanvasRenderingContext2d, width: f64, hover: Hover) {
	let page = add_page_bounds(width);
	ctx.save();
	let _ = ctx.translate(width - ADD_PAGE_OFFSET.0, ADD_PAGE_OFFSET.1);
	if hover.add_page {
		let _ = ctx.scale(1.2, 1.2);
	}
	rounded_rect(
		ctx,
		Rect {
			x: -page.width / 2.0,
			y: -page.height / 2.0,
			..page
		},
		CORNER_RADIUS,
	);
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
	ctx.fill();
	draw_plus(ctx);
	ctx.restore();

	let (cx, cy) = add_reference_center(width);
	ctx.save();
	let _ = ctx.translate(cx, cy);
	if hover.add_reference {
		let _ = ctx.scale(1.2, 1.2);
	}
	ctx.begin_path();
	let _ = ctx.arc(0.0, 0.0, ADD_REFERENCE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("rgba(192, 192, 192, 0.9)");
	ctx.fill();
	draw_plus(ctx);
	ctx.restore();
}

fn draw_empty_state(ctx: &CanvasRenderingContext2d, empty: &EmptyState, width: f64, height: f64) {
	ctx.save();
	let _ = ctx.translate(width / 2.0, height / 3.0);
	ctx.set_global_alpha(0.3);
	rounded_rect(
		ctx,
		Rect {
			x: -300.0,
			y: -70.0,
			width: 600.0,
			height: 200.0,
		},
		CORNER_RADIUS,
	);
	ctx.set_fill_style_str("white");
	ctx.fill();
	ctx.set_global_alpha(1.0);

	ctx.set_fill_style_str("black");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font("40px sans-serif");
	let _ = ctx.fill_text(empty.headline, 0.0, 0.0);
	ctx.set_font("24px sans-serif");
	let _ = ctx.fill_text(empty.hint, 0.0, 48.0);
	ctx.restore();
}
