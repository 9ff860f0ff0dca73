use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use anyhow::{Context, Result, anyhow};
use wasm_bindgen::prelude::*;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn schedule(callback: &Closure<dyn FnMut()>) -> Result<i32> {
	web_sys::window()
		.context("no window")?
		.request_animation_frame(callback.as_ref().unchecked_ref())
		.map_err(|err| anyhow!("requestAnimationFrame failed: {:?}", err))
}

/// A `requestAnimationFrame` loop that runs until dropped.
///
/// The scheduled closure only holds a weak reference to itself, so dropping
/// the loop frees it and cancels the pending frame.
pub struct FrameLoop {
	callback: FrameCallback,
	handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	pub fn start(mut on_frame: impl FnMut() + 'static) -> Result<Self> {
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let handle = Rc::new(Cell::new(None));

		let weak: Weak<_> = Rc::downgrade(&callback);
		let handle_inner = handle.clone();
		*callback.borrow_mut() = Some(Closure::new(move || {
			on_frame();
			let Some(callback) = weak.upgrade() else {
				return;
			};
			if let Some(ref cb) = *callback.borrow() {
				match schedule(cb) {
					Ok(id) => handle_inner.set(Some(id)),
					Err(err) => log::error!("{err:#}"),
				}
			}
		}));

		if let Some(ref cb) = *callback.borrow() {
			handle.set(Some(schedule(cb)?));
		}
		Ok(Self { callback, handle })
	}
}

impl Drop for FrameLoop {
	fn drop(&mut self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// A window event listener removed on drop.
pub struct WindowListener {
	event: &'static str,
	callback: Closure<dyn FnMut()>,
}

impl WindowListener {
	pub fn add(event: &'static str, on_event: impl FnMut() + 'static) -> Result<Self> {
		let callback = Closure::<dyn FnMut()>::new(on_event);
		web_sys::window()
			.context("no window")?
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.map_err(|err| anyhow!("failed to listen for {event}: {:?}", err))?;
		Ok(Self { event, callback })
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
		}
	}
}
