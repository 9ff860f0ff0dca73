use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::{use_params_map, use_query_map};

use crate::components::book_net::{PageNode, time_ago};
use crate::store::BookStore;

fn find_page(store: &dyn BookStore, book_id: &str, page_id: &str) -> Result<PageNode> {
	store
		.load_book(book_id)?
		.nodes
		.into_iter()
		.find(|n| n.id == page_id)
		.with_context(|| format!("{book_id} has no page {page_id:?}"))
}

/// A single page, read-only with `?view=preview`.
#[component]
pub fn PageView() -> impl IntoView {
	let params = use_params_map();
	let query = use_query_map();
	let store = expect_context::<Arc<dyn BookStore>>();

	let book_id = move || params.read().get("book_id").unwrap_or_default();
	let page_id = move || params.read().get("page_id").unwrap_or_default();
	let preview = move || query.read().get("view").as_deref() == Some("preview");

	let page = move || match find_page(store.as_ref(), &book_id(), &page_id()) {
		Ok(page) => {
			let updated = time_ago(page.updated_on, Utc::now());
			view! {
				<article class="page-view">
					<p class="page-mode">{if preview() { "Preview" } else { "Editing" }}</p>
					<h1>{page.name}</h1>
					<p>{page.short_desc}</p>
					<p class="page-footer">"Last updated " {updated}</p>
				</article>
			}
			.into_any()
		}
		Err(err) => {
			log::warn!("{err:#}");
			view! { <p class="page-error">{err.to_string()}</p> }.into_any()
		}
	};

	view! {
		<div class="page">
			{page}
			<A href=move || format!("/{}", book_id())>"Back to the book network"</A>
		</div>
	}
}
