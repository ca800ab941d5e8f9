//! HTML fragments and the slot substitution used to fill them.
//!
//! Templates contain `{{slot}}` markers. Substitution is a single pass: values
//! are inserted verbatim and never rescanned, and unknown slots render empty.
//! Callers escape untrusted values with [`escape_html`] before passing them in.

/// Substitutes named values into a textual template.
pub trait Templater: Send + Sync {
    fn render(&self, template: &str, slots: &[(&str, &str)]) -> String;
}

/// `{{name}}` substitution with optional whitespace inside the braces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotTemplater;

impl Templater for SlotTemplater {
    fn render(&self, template: &str, slots: &[(&str, &str)]) -> String {
        let values: usize = slots.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(template.len() + values);
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                // Unterminated marker, emit as-is.
                out.push_str(&rest[start..]);
                return out;
            };
            let name = after[..end].trim();
            if let Some((_, value)) = slots.iter().find(|(slot, _)| *slot == name) {
                out.push_str(value);
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        out
    }
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Static landing page with the upload form.
pub const INDEX_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Pixel Filter</title>
  <script src="https://unpkg.com/htmx.org@1.9.12"></script>
  <script src="https://unpkg.com/htmx.org@1.9.12/dist/ext/json-enc.js"></script>
  <style>
    body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
    img { max-width: 100%; image-rendering: pixelated; border: 1px solid #ccc; }
    .filters button { margin: 0.25rem; }
  </style>
</head>
<body>
  <h1>Pixel Filter</h1>
  <form action="/upload" method="post" enctype="multipart/form-data"
        hx-post="/upload" hx-encoding="multipart/form-data" hx-target="#upload-result">
    <input type="file" name="file" accept="image/*" required>
    <button type="submit">Upload</button>
  </form>
  <div id="upload-result"></div>
</body>
</html>
"##;

/// Result of `/upload`: the image plus one control per filter.
///
/// The PNG is embedded once. The controls container contributes `imageData`
/// to every button's request by reading the `<img>` source, so each control
/// only carries its filter name.
pub const UPLOAD_RESULT: &str = r##"<div class="upload-result">
  <h2>Uploaded image</h2>
  <img id="uploaded-image" alt="uploaded image" src="data:image/png;base64,{{image}}">
  <div class="filters"
       hx-vals='js:{"imageData": document.getElementById("uploaded-image").getAttribute("src")}'>
{{controls}}
  </div>
  <div id="filter-result"></div>
</div>
"##;

/// One follow-up control posting `{"filter": name}` to `/filter`.
pub const FILTER_CONTROL: &str = r##"<button type="button" hx-post="/filter" hx-ext="json-enc"
        hx-target="#filter-result" hx-vals='{"filter": "{{filter}}"}'>{{filter}}</button>"##;

/// Result of `/filter`.
pub const FILTER_RESULT: &str = r##"<div class="filter-result">
  <h2>Filtered image</h2>
  <img alt="filtered image" src="data:image/png;base64,{{image}}">
</div>
"##;
