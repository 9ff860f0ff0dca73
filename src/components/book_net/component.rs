use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::frame::{FrameLoop, WindowListener};
use super::mode::{EditMode, ModeToggle};
use super::render::{CanvasMeasure, render};
use super::state::BookNetState;
use super::types::{BookNetData, BookNetEvent};

type StateSlot = StoredValue<Option<BookNetState>, LocalStorage>;
type FrameSlot = StoredValue<Option<FrameLoop>, LocalStorage>;

fn with_state<U>(state: StateSlot, f: impl FnOnce(&mut BookNetState) -> U) -> Option<U> {
	state.try_update_value(|slot| slot.as_mut().map(f)).flatten()
}

fn canvas_size(canvas: &HtmlCanvasElement, fullscreen: bool) -> Result<(f64, f64)> {
	if fullscreen {
		let window = web_sys::window().context("no window")?;
		let dim = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
			v.ok().and_then(|v| v.as_f64()).context("window size unavailable")
		};
		return Ok((dim(window.inner_width())?, dim(window.inner_height())?));
	}
	Ok(canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0)))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.map_err(|err| anyhow!("getContext failed: {:?}", err))?
		.context("canvas has no 2d context")?
		.dyn_into()
		.map_err(|_| anyhow!("2d context has an unexpected type"))
}

/// Stops the running view, if any, before another is built.
fn teardown(state: StateSlot, frame: FrameSlot) {
	frame.set_value(None);
	state.try_update_value(|slot| {
		if let Some(mut old) = slot.take() {
			old.dispose();
		}
	});
}

fn mount(
	canvas: &HtmlCanvasElement,
	data: &BookNetData,
	mode: EditMode,
	signed_in: bool,
	fullscreen: bool,
	state: StateSlot,
	frame: FrameSlot,
) -> Result<()> {
	let (width, height) = canvas_size(canvas, fullscreen)?;
	canvas.set_width(width as u32);
	canvas.set_height(height as u32);
	let ctx = context_2d(canvas)?;

	let built = BookNetState::new(
		data,
		mode,
		signed_in,
		width,
		height,
		Utc::now(),
		&CanvasMeasure(&ctx),
	);
	state.set_value(Some(built));

	let looped = FrameLoop::start(move || {
		with_state(state, |s| {
			if s.tick() {
				render(s, &ctx);
			}
		});
	})?;
	frame.set_value(Some(looped));
	Ok(())
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn BookNetCanvas(
	#[prop(into)] data: Signal<BookNetData>,
	mode: RwSignal<EditMode>,
	#[prop(into)] signed_in: Signal<bool>,
	on_event: impl Fn(BookNetEvent) + 'static,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: StateSlot = StoredValue::new_local(None);
	let frame: FrameSlot = StoredValue::new_local(None);
	let resized = RwSignal::new(0u32);
	let on_event: Rc<dyn Fn(BookNetEvent)> = Rc::new(on_event);

	let resize = StoredValue::new_local(None::<WindowListener>);
	if fullscreen {
		match WindowListener::add("resize", move || resized.update(|n| *n = n.wrapping_add(1))) {
			Ok(listener) => resize.set_value(Some(listener)),
			Err(err) => log::warn!("book net canvas will not follow resizes: {err:#}"),
		}
	}

	Effect::new(move |_| {
		let data = data.get();
		let mode = mode.get();
		let signed_in = signed_in.get();
		resized.track();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};

		teardown(state, frame);
		if let Err(err) = mount(&canvas, &data, mode, signed_in, fullscreen, state, frame) {
			log::error!("book net canvas: {err:#}");
		}
	});

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			with_state(state, |s| s.pointer_down(x, y));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			with_state(state, |s| s.pointer_move(x, y));
		}
	};

	let dispatch = on_event.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		// Handlers may rebuild the view, so the state is released first.
		let events = with_state(state, |s| s.pointer_up(x, y)).unwrap_or_default();
		for event in events {
			dispatch(event);
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		with_state(state, |s| s.pointer_leave());
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			with_state(state, |s| s.wheel(x, y, ev.delta_y()));
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="book-net-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block;"
		/>
		<SettingsPanel mode=mode signed_in=signed_in on_event=on_event />
	}
}

#[component]
fn SettingsPanel(
	mode: RwSignal<EditMode>,
	signed_in: Signal<bool>,
	on_event: Rc<dyn Fn(BookNetEvent)>,
) -> impl IntoView {
	let toggle = move |toggle: ModeToggle| {
		let signed_in = signed_in.get_untracked();
		mode.update(|m| *m = m.apply(toggle, signed_in));
		log::debug!("edit mode is now {:?}", mode.get_untracked());
	};
	let disabled = move |toggle: ModeToggle| !mode.get().allows(toggle, signed_in.get());
	let back = on_event.clone();

	view! {
		<div class="book-net-settings">
			<button title="Back" on:click=move |_| back(BookNetEvent::GoBack)>
				"\u{2190}"
			</button>
			<button title="Refresh" on:click=move |_| on_event(BookNetEvent::Refresh)>
				"\u{27f3}"
			</button>
			<button
				title=move || {
					if !signed_in.get() {
						"Please Sign-in to Edit"
					} else if mode.get().is_editing() {
						"Save"
					} else {
						"Edit"
					}
				}
				disabled=move || disabled(ModeToggle::Edit)
				on:click=move |_| toggle(ModeToggle::Edit)
			>
				{move || if mode.get().is_editing() { "\u{2714}" } else { "\u{2699}" }}
			</button>
			<button
				title="Edit nodes"
				class:active=move || mode.get() == EditMode::NodeEdit
				disabled=move || disabled(ModeToggle::NodeEdit)
				on:click=move |_| toggle(ModeToggle::NodeEdit)
			>
				"Nodes"
			</button>
			<button
				title="Edit links"
				class:active=move || mode.get() == EditMode::LinkEdit
				disabled=move || disabled(ModeToggle::LinkEdit)
				on:click=move |_| toggle(ModeToggle::LinkEdit)
			>
				"Links"
			</button>
		</div>
	}
}
