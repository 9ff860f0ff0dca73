//! Line breaking for text drawn inside a fixed box.

/// Reports the rendered width of a string at a font size. Supplied by the
/// rendering surface.
pub trait MeasureText {
	fn text_width(&self, text: &str, font_size: f64) -> f64;
}

impl<F> MeasureText for F
where
	F: Fn(&str, f64) -> f64,
{
	fn text_width(&self, text: &str, font_size: f64) -> f64 {
		self(text, font_size)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
	pub width: f64,
	pub height: f64,
	pub font_size: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
	/// Break between whitespace-separated words.
	Words,
	/// Break between any two characters.
	Chars,
}

impl WrapMode {
	fn joiner(self) -> &'static str {
		match self {
			WrapMode::Words => " ",
			WrapMode::Chars => "",
		}
	}

	fn tokens(self, text: &str) -> Vec<&str> {
		match self {
			WrapMode::Words => text.split_whitespace().collect(),
			WrapMode::Chars => text
				.char_indices()
				.map(|(i, c)| &text[i..i + c.len_utf8()])
				.collect(),
		}
	}
}

pub const ELLIPSIS: &str = "...";

/// Breaks `text` into lines no wider than `bounds.width`.
///
/// Line `k` is only started when `(k + 1) * font_size <= height`; the first
/// line always renders. When the next line would not fit, the current line
/// is closed with [`ELLIPSIS`], dropping trailing tokens until the marker
/// fits. A token wider than the box on its own keeps a line to itself.
pub fn wrap_text(text: &str, bounds: TextBox, mode: WrapMode, measure: &impl MeasureText) -> Vec<String> {
	let joiner = mode.joiner();
	let fits = |candidate: &str| measure.text_width(candidate, bounds.font_size) <= bounds.width;

	let mut lines: Vec<String> = Vec::new();
	let mut line: Vec<&str> = Vec::new();

	for token in mode.tokens(text) {
		line.push(token);
		if fits(&line.join(joiner)) {
			continue;
		}
		line.pop();
		if line.is_empty() {
			line.push(token);
			continue;
		}

		let next_line = lines.len() + 1;
		if (next_line + 1) as f64 * bounds.font_size > bounds.height {
			lines.push(truncate(line, mode, &fits));
			return lines;
		}
		lines.push(line.join(joiner));
		line = vec![token];
	}

	if !line.is_empty() {
		lines.push(line.join(joiner));
	}
	lines
}

fn truncate(mut line: Vec<&str>, mode: WrapMode, fits: &impl Fn(&str) -> bool) -> String {
	let joiner = mode.joiner();
	let with_marker = |line: &[&str]| {
		if line.is_empty() {
			ELLIPSIS.to_string()
		} else {
			format!("{}{}{}", line.join(joiner), joiner, ELLIPSIS)
		}
	};
	while !line.is_empty() && !fits(&with_marker(&line)) {
		line.pop();
	}
	with_marker(&line)
}
