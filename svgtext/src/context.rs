// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context for parsing the text of a document.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::dom::{Document, NodeId};
use crate::font::{CharacterTable, FontBackend};
use crate::text::ParsedText;
use crate::Error;

/// Tuning of the layout engine.
#[derive(Clone, Debug)]
pub struct LayoutSettings {
    /// Font size, in px, of text that sets none.
    pub default_font_size: f64,
    /// How many candidate lines flowed text may try before giving up on the rest of its
    /// characters.
    pub flow_iteration_cap: usize,
    /// How close, in user units, the `y` of two lines has to be for their chunks to be
    /// linked by [`ParsedText::make_next_chain`].
    pub same_y_tolerance: f64,
    /// Characters after which flowed text may break a line.
    pub break_chars: String,
    /// A word too long for its line is broken inside when the region is wider than this
    /// many line heights, and moved to the next line otherwise.
    pub emergency_break_factor: f64,
    /// Redistributes position lists that are longer than the text they annotate
    /// before parsing.
    pub remove_position_overflows: bool,
    /// Applies the pair corrections of the character table.
    pub differential_advances: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_font_size: 12.,
            flow_iteration_cap: 1000,
            same_y_tolerance: 1e-3,
            break_chars: " -!}|/?".to_owned(),
            emergency_break_factor: 4.,
            remove_position_overflows: true,
            differential_advances: true,
        }
    }
}

/// Owns the font backend, the character table of a document and the parsed text of its
/// elements.
///
/// One context serves one document: the character table only covers the elements it was
/// built for.
pub struct TextContext {
    backend: Box<dyn FontBackend>,
    settings: LayoutSettings,
    ctable: Option<Arc<CharacterTable>>,
    parsed: HashMap<NodeId, ParsedText>,
}

impl fmt::Debug for TextContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextContext")
            .field("backend", &self.backend)
            .field("settings", &self.settings)
            .field("ctable", &self.ctable)
            .field("parsed", &self.parsed.len())
            .finish()
    }
}

#[cfg(feature = "system")]
impl Default for TextContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TextContext {
    /// Creates a context measuring with the fonts installed on the system.
    #[cfg(feature = "system")]
    pub fn new() -> Self {
        Self::with_backend(crate::font::SystemFonts::new())
    }

    /// Creates a context measuring with `backend`.
    pub fn with_backend(backend: impl FontBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            settings: LayoutSettings::default(),
            ctable: None,
            parsed: HashMap::new(),
        }
    }

    /// Replaces the settings. Text parsed before keeps the settings it was parsed with.
    pub fn with_settings(mut self, settings: LayoutSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The settings.
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// The font backend.
    pub fn backend_mut(&mut self) -> &mut dyn FontBackend {
        &mut *self.backend
    }

    /// Builds the character table for `elements`, or for every text element of the
    /// document if `elements` is empty, and returns it.
    ///
    /// Text parsed with the previous table is dropped.
    pub fn make_char_table(&mut self, doc: &Document, elements: &[NodeId]) -> Arc<CharacterTable> {
        let elements = if elements.is_empty() {
            text_elements(doc)
        } else {
            elements.to_vec()
        };
        log::debug!("building the character table of {} elements", elements.len());
        let table = Arc::new(CharacterTable::build(doc, &elements, &mut *self.backend));
        self.ctable = Some(Arc::clone(&table));
        self.parsed.clear();
        table
    }

    /// Drops the character table and all parsed text. The next request builds a new
    /// table.
    pub fn reset_char_table(&mut self) {
        self.ctable = None;
        self.parsed.clear();
    }

    /// The character table, built for every text element of the document if there is
    /// none yet.
    pub fn char_table(&mut self, doc: &Document) -> Arc<CharacterTable> {
        match &self.ctable {
            Some(t) => Arc::clone(t),
            None => self.make_char_table(doc, &[]),
        }
    }

    /// The parsed text of `elem`, parsed on first request.
    ///
    /// An element the character table was not built for causes the table to be rebuilt
    /// for it and the elements it had.
    pub fn parsed_text(
        &mut self,
        doc: &mut Document,
        elem: NodeId,
    ) -> Result<&mut ParsedText, Error> {
        doc.check(elem)?;
        self.parsed.retain(|&k, _| doc.contains(k));
        if !self.parsed.contains_key(&elem) {
            let covered = self
                .ctable
                .as_ref()
                .is_some_and(|t| t.elements().contains(&elem));
            let table = if covered {
                self.char_table(doc)
            } else {
                let mut elements: Vec<NodeId> = self
                    .ctable
                    .as_ref()
                    .map(|t| t.elements().iter().copied().filter(|&e| doc.contains(e)).collect())
                    .unwrap_or_else(|| text_elements(doc));
                if !elements.contains(&elem) {
                    elements.push(elem);
                }
                // Rebuilding drops what was parsed; keep it, it is still valid.
                let kept = core::mem::take(&mut self.parsed);
                let table = self.make_char_table(doc, &elements);
                self.parsed = kept;
                table
            };
            let pt = ParsedText::new(doc, elem, table, self.settings.clone())?;
            self.parsed.insert(elem, pt);
        }
        self.parsed.get_mut(&elem).ok_or(Error::UnknownNode(elem))
    }

    /// Replaces the cached parsed text of `elem`, or drops it.
    pub fn set_parsed_text(&mut self, elem: NodeId, parsed: Option<ParsedText>) {
        match parsed {
            Some(pt) => {
                self.parsed.insert(elem, pt);
            }
            None => {
                self.parsed.remove(&elem);
            }
        }
    }

    /// Drops the cached parsed text of `elem`, so that the next request parses it again.
    pub fn invalidate(&mut self, elem: NodeId) {
        self.parsed.remove(&elem);
    }
}

/// Every `text` and `flowRoot` element of the document.
fn text_elements(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&d| matches!(doc.tag(d), "text" | "flowRoot"))
        .collect()
}
