// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout and reflow of SVG text.
//!
//! `svgtext` reproduces where an SVG editor draws every character of a `<text>` or
//! `<flowRoot>` element, without a renderer: characters are measured once per document
//! into a [`CharacterTable`](font::CharacterTable), and each text element is parsed into a
//! [`ParsedText`](text::ParsedText), a model of lines, chunks (runs sharing one `x`/`y`
//! anchor) and characters. Geometry is computed lazily from that model, and edits to the
//! model (deleting characters, splitting them into new elements, converting kerning,
//! fusing fonts, flattening flowed text) are written back to the document so that the
//! characters that remain stay where they were drawn.
//!
//! ## Example
//!
//! ```
//! use svgtext::dom::Document;
//! use svgtext::testing::FixedFonts;
//! use svgtext::TextContext;
//!
//! let mut doc = Document::parse(
//!     r#"<svg xmlns="http://www.w3.org/2000/svg"><text id="t" x="10" y="20">Hello</text></svg>"#,
//! )
//! .unwrap();
//! let text = doc.element_by_id("t").unwrap();
//!
//! let mut cx = TextContext::with_backend(FixedFonts::new());
//! let parsed = cx.parsed_text(&mut doc, text).unwrap();
//! assert_eq!(parsed.lines().len(), 1);
//! assert_eq!(parsed.txt(), ["Hello"]);
//! ```
//!
//! ## Features
//!
//! - `system` (enabled by default): Enables [`SystemFonts`](font::SystemFonts), the metrics
//!   backend backed by the fonts installed on the system.
//! - `shaping` (enabled by default): Measures characters by shaping bracketed strings when
//!   the backend supports it, instead of only reading font tables.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use kurbo;
pub use svgtext_primitives as primitives;

mod context;
mod error;
mod util;

pub mod dom;
pub mod font;
pub mod testing;
pub mod text;

#[cfg(test)]
mod tests;

pub use context::{LayoutSettings, TextContext};
pub use error::Error;
