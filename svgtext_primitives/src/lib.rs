// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CSS value types for SVG text.
//!
//! This crate is a small, `no_std`-friendly vocabulary layer for the values the `svgtext`
//! layout engine reads out of SVG styles: font weights, widths and slants, `font-family`
//! lists, lengths with their units, and the `text-anchor` / `text-align` keywords.
//!
//! ## Features
//!
//! - `std` (enabled by default): Float rounding, needed to snap weights and widths to
//!   their CSS keyword values.
//!
//! ## Example
//!
//! ```
//! use svgtext_primitives::{FamilyList, Length, TextAnchor, Unit};
//!
//! let len = Length::parse("12pt").unwrap();
//! assert_eq!(len.unit, Unit::Pt);
//! assert_eq!(len.to_px(), Some(16.0));
//!
//! let families = FamilyList::parse("Arial, \"DejaVu Sans\", sans-serif");
//! assert_eq!(families.to_css(), "'Arial','DejaVu Sans','sans-serif'");
//!
//! assert_eq!(TextAnchor::parse("middle").map(TextAnchor::fraction), Some(0.5));
//! ```
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
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod font;
mod font_family;
mod generic_family;
mod length;
mod text;

pub use font::{FontStyle, FontWeight, FontWidth};
pub use font_family::{FamilyList, FamilyName};
pub use generic_family::GenericFamily;
pub use length::{Length, Unit, DEFAULT_FONT_SIZE};
pub use text::{Direction, TextAlign, TextAnchor};
