use std::sync::Arc;
use std::time::Duration;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_params_map};

use crate::components::book_net::{BookNetCanvas, BookNetData, BookNetEvent, EditMode};
use crate::store::{BookStore, SAMPLE_BOOK_ID};

const NOTICE_TIMEOUT: Duration = Duration::from_secs(4);

/// Network of one book's pages. Served at `/` for the sample book and at
/// `/:book_id` for any other.
#[component]
pub fn BookView() -> impl IntoView {
	let params = use_params_map();
	let book_id = Memo::new(move |_| {
		params
			.read()
			.get("book_id")
			.unwrap_or_else(|| SAMPLE_BOOK_ID.to_string())
	});
	let store = StoredValue::new(expect_context::<Arc<dyn BookStore>>());

	let data = RwSignal::new(BookNetData::default());
	let mode = RwSignal::new(EditMode::default());
	let signed_in = RwSignal::new(false);
	let notice = RwSignal::new(None::<String>);

	let notify = move |text: String| {
		notice.set(Some(text.clone()));
		set_timeout(
			move || {
				if notice.get_untracked().as_deref() == Some(text.as_str()) {
					notice.set(None);
				}
			},
			NOTICE_TIMEOUT,
		);
	};

	let reload = move |book_id: &str| match store.with_value(|s| s.load_book(book_id)) {
		Ok(book) => {
			log::debug!("loaded {book_id}: {} pages", book.nodes.len());
			data.set(book);
		}
		Err(err) => {
			log::warn!("could not load {book_id}: {err:#}");
			data.set(BookNetData::default());
			notify(err.to_string());
		}
	};

	Effect::new(move |_| reload(&book_id.get()));

	let navigate = use_navigate();
	let on_event = move |event: BookNetEvent| {
		let book_id = book_id.get_untracked();
		match event {
			BookNetEvent::SaveLinks { links, change } => {
				data.update(|d| d.links = links.clone());
				match store.with_value(|s| s.save_links(&book_id, &links)) {
					Ok(()) => notify(format!("Link {} successfully", change.verb())),
					Err(err) => {
						log::error!("saving links for {book_id} failed: {err:#}");
						notify(format!("Could not save links: {err}"));
						reload(&book_id);
					}
				}
			}
			BookNetEvent::OpenPage(page_id) => {
				log::info!("opening {book_id}/{page_id}");
				navigate(
					&format!("/{book_id}/{page_id}?view=preview"),
					NavigateOptions::default(),
				);
			}
			BookNetEvent::OpenReference(url) => {
				log::info!("following reference {url}");
				navigate(&url, NavigateOptions::default());
			}
			BookNetEvent::EditPage(page_id) => {
				navigate(&format!("/{book_id}/{page_id}"), NavigateOptions::default());
			}
			BookNetEvent::DeletePage(page_id) => notify(format!("Delete requested for {page_id}")),
			BookNetEvent::AddPage => notify("New page requested".into()),
			BookNetEvent::AddReference => notify("New reference requested".into()),
			BookNetEvent::Refresh => reload(&book_id),
			BookNetEvent::GoBack => {
				if let Some(Err(err)) = web_sys::window()
					.and_then(|w| w.history().ok())
					.map(|h| h.back())
				{
					log::warn!("history back failed: {:?}", err);
				}
			}
		}
	};

	view! {
		<div class="fullscreen-graph">
			<BookNetCanvas data=data mode=mode signed_in=signed_in on_event=on_event fullscreen=true />
			<div class="graph-overlay">
				<h1>{move || book_id.get()}</h1>
				<button on:click=move |_| signed_in.update(|s| *s = !*s)>
					{move || if signed_in.get() { "Sign out" } else { "Sign in" }}
				</button>
			</div>
			{move || notice.get().map(|text| view! { <div class="notice">{text}</div> })}
		</div>
	}
}
