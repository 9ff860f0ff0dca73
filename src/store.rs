//! Where books come from and where edited links go.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, Utc};

use crate::components::book_net::{BookNetData, PageLink, PageNode};

/// Book shown on the landing route.
pub const SAMPLE_BOOK_ID: &str = "readverse-guide";
const STYLE_BOOK_ID: &str = "style-guide";

/// Document store boundary for the book network.
pub trait BookStore: Send + Sync {
	/// Pages and materialized references of a book, with its links.
	fn load_book(&self, book_id: &str) -> Result<BookNetData>;

	/// Replaces the full link list of a book.
	fn save_links(&self, book_id: &str, links: &[PageLink]) -> Result<()>;
}

/// A [`BookStore`] kept in memory for the lifetime of the app.
#[derive(Default)]
pub struct MemoryBookStore {
	books: RwLock<HashMap<String, BookNetData>>,
}

impl MemoryBookStore {
	pub fn insert(&self, book_id: impl Into<String>, data: BookNetData) {
		if let Ok(mut books) = self.books.write() {
			books.insert(book_id.into(), data);
		}
	}

	/// A store holding [`SAMPLE_BOOK_ID`] and the book it references.
	pub fn with_sample() -> Self {
		let store = Self::default();
		store.insert(SAMPLE_BOOK_ID, sample_book());
		store.insert(STYLE_BOOK_ID, style_book());
		store
	}
}

impl BookStore for MemoryBookStore {
	fn load_book(&self, book_id: &str) -> Result<BookNetData> {
		let books = self.books.read().map_err(|_| anyhow!("book store is poisoned"))?;
		books
			.get(book_id)
			.cloned()
			.with_context(|| format!("no book with id {book_id:?}"))
	}

	fn save_links(&self, book_id: &str, links: &[PageLink]) -> Result<()> {
		let mut books = self.books.write().map_err(|_| anyhow!("book store is poisoned"))?;
		let book = books
			.get_mut(book_id)
			.with_context(|| format!("no book with id {book_id:?}"))?;

		for link in links {
			for end in [&link.source, &link.target] {
				if !book.nodes.iter().any(|n| &n.id == end) {
					bail!("link {} - {} refers to unknown page {end:?}", link.source, link.target);
				}
			}
		}
		book.links = links.to_vec();
		log::info!("saved {} links for {book_id}", links.len());
		Ok(())
	}
}

fn page(id: &str, name: &str, desc: &str, age: Duration) -> PageNode {
	PageNode {
		id: id.into(),
		name: name.into(),
		short_desc: desc.into(),
		updated_on: Utc::now() - age,
		ref_url: None,
		cover: None,
	}
}

fn style_book() -> BookNetData {
	BookNetData {
		nodes: vec![
			page(
				"voice",
				"Voice and tone",
				"Write plainly, address the reader directly and keep sentences short.",
				Duration::days(9),
			),
			page(
				"formatting",
				"Formatting",
				"When to use lists, tables and code blocks.",
				Duration::days(21),
			),
		],
		links: vec![PageLink::new("voice", "formatting")],
	}
}

fn sample_book() -> BookNetData {
	let nodes = vec![
		PageNode {
			cover: Some("covers/welcome.png".into()),
			..page(
				"welcome",
				"Welcome",
				"What this book covers and how its pages fit together.",
				Duration::days(40),
			)
		},
		page(
			"writing-pages",
			"Writing pages",
			"Markdown basics, headings and the generated table of contents.",
			Duration::hours(5),
		),
		page(
			"linking",
			"Linking pages",
			"Connect related pages in the book network by drawing links between their anchors.",
			Duration::minutes(12),
		),
		page(
			"references",
			"References",
			"Bring a page from another book into this one without copying it.",
			Duration::days(3),
		),
		page(
			"sharing",
			"Sharing",
			"Publishing a book and choosing who may read or edit it.",
			Duration::days(400),
		),
		PageNode {
			ref_url: Some(format!("/{STYLE_BOOK_ID}/voice?view=preview")),
			..page(
				"style-guide/voice",
				"Voice and tone",
				"Referenced from the style guide.",
				Duration::days(9),
			)
		},
	];

	let links = vec![
		PageLink::new("welcome", "writing-pages"),
		PageLink::new("welcome", "linking"),
		PageLink::new("linking", "references"),
		PageLink::new("references", "style-guide/voice"),
		PageLink::new("welcome", "sharing"),
	];

	BookNetData { nodes, links }
}
