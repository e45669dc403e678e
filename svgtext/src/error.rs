// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use crate::dom::NodeId;

/// Errors reported by the document model and the text engine.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A character was laid out in a font style the character table has no metrics for.
    ///
    /// This happens when text is added to a document after its character table was built.
    /// The table has to be rebuilt (see [`TextContext::reset_char_table`]) before the text
    /// can be parsed.
    ///
    /// [`TextContext::reset_char_table`]: crate::TextContext::reset_char_table
    MissingMetric {
        /// The true font style that was looked up, in CSS form.
        style: String,
        /// The character that was looked up.
        ch: char,
        /// The styles (if the style itself was missing) or characters (if only the
        /// character was missing) the table does have.
        known: Vec<String>,
    },
    /// The document could not be parsed as XML.
    Xml(String),
    /// A node id that does not refer to a live node of the document.
    UnknownNode(NodeId),
    /// The element is not a `text` or `flowRoot` element.
    NotText(NodeId),
    /// The document could not be serialized.
    Write(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetric { style, ch, known } => {
                write!(
                    f,
                    "no metrics for {ch:?} in style {style}; the character table is out of date \
                     and has to be rebuilt (known: {})",
                    known.join(", ")
                )
            }
            Self::Xml(msg) => write!(f, "invalid XML: {msg}"),
            Self::UnknownNode(id) => write!(f, "unknown node {id:?}"),
            Self::NotText(id) => write!(f, "node {id:?} is not a text element"),
            Self::Write(msg) => write!(f, "could not write document: {msg}"),
        }
    }
}

impl core::error::Error for Error {}
