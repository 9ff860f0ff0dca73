use chrono::{DateTime, Utc};

/// Rendering box size every node gets when the pipeline is built.
pub const NODE_WIDTH: f64 = 175.0;
pub const NODE_HEIGHT: f64 = 120.0;

/// A page of the open book, or a materialized reference to a page elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct PageNode {
	pub id: String,
	pub name: String,
	pub short_desc: String,
	pub updated_on: DateTime<Utc>,
	/// Set for cross-book references; clicking navigates here instead.
	pub ref_url: Option<String>,
	pub cover: Option<String>,
}

/// Undirected edge between two node ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageLink {
	pub source: String,
	pub target: String,
}

impl PageLink {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// True when this link joins `a` and `b`, in either direction.
	pub fn connects(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookNetData {
	pub nodes: Vec<PageNode>,
	pub links: Vec<PageLink>,
}

/// Which kind of edit produced a link list handed back for persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkChange {
	Added,
	Deleted,
}

impl LinkChange {
	pub fn verb(self) -> &'static str {
		match self {
			LinkChange::Added => "added",
			LinkChange::Deleted => "deleted",
		}
	}
}

/// Side effects the view asks its owner to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum BookNetEvent {
	/// Persist the full link list after a local edit.
	SaveLinks {
		links: Vec<PageLink>,
		change: LinkChange,
	},
	/// Open a page of this book in the read-only route.
	OpenPage(String),
	/// Follow a reference node's `ref_url`.
	OpenReference(String),
	EditPage(String),
	DeletePage(String),
	AddPage,
	AddReference,
	Refresh,
	GoBack,
}
