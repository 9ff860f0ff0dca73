pub mod book;
pub mod not_found;
pub mod page_view;
