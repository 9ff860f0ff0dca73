//! Leptos client-side app wiring and routes.

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
mod pages;
mod store;

// Top-Level pages
use crate::pages::book::BookView;
use crate::pages::not_found::NotFound;
use crate::pages::page_view::PageView;
use crate::store::{BookStore, MemoryBookStore};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router for the book network, single pages and 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	provide_context::<Arc<dyn BookStore>>(Arc::new(MemoryBookStore::with_sample()));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="ReadVerse book network" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=BookView />
				<Route path=path!("/:book_id") view=BookView />
				<Route path=path!("/:book_id/:page_id") view=PageView />
			</Routes>
		</Router>
	}
}
