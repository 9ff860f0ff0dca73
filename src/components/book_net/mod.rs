//! Force-directed book network drawn on a canvas: pages as cards, links
//! between them, and the gestures that edit those links.

mod component;
mod frame;
mod interaction;
mod layout;
mod mode;
mod render;
mod scene;
mod state;
mod types;
mod wrap;

pub use component::BookNetCanvas;
pub use mode::EditMode;
pub use scene::time_ago;
pub use types::{BookNetData, BookNetEvent, PageLink, PageNode};
