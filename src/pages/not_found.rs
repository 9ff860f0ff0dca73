use leptos::prelude::*;
use leptos_router::components::A;

/// Fallback for unknown routes.
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="page">
			<h1>"Page not found"</h1>
			<A href="/">"Back to the book network"</A>
		</div>
	}
}
