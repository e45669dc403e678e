// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::{HashMap, HashSet};

use super::{FontBackend, FontKey, FontMetrics, StringMetrics};
use crate::dom::{Document, NodeId};
use crate::text::TextTree;
use crate::Error;

/// Serializes string measurement. Shaping contexts of some backends are not reentrant.
static MEASURE_LOCK: Mutex<()> = Mutex::new(());

/// Characters that take up no advance of their own.
const BAD_CHARS: [char; 2] = ['\n', '\r'];

/// Metrics of one character in one true font, per em.
///
/// A `CProp` is shared by every occurrence of the character in that font; multiply by the
/// untransformed font size to get user units.
#[derive(Clone, Debug, PartialEq)]
pub struct CProp {
    /// The character.
    pub char: char,
    /// Logical advance.
    pub charw: f64,
    /// Advance of a space in the same font.
    pub spacew: f64,
    /// Cap height.
    pub caph: f64,
    /// Ink box as `[x, y, width, height]`, `y` measured downwards from the baseline.
    pub inkbb: [f64; 4],
    dadvs: Arc<HashMap<(char, char), f64>>,
}

impl CProp {
    /// Creates a record with no pair deltas.
    pub fn new(char: char, charw: f64, spacew: f64, caph: f64, inkbb: [f64; 4]) -> Self {
        Self {
            char,
            charw,
            spacew,
            caph,
            inkbb,
            dadvs: Arc::default(),
        }
    }

    fn zero(char: char) -> Self {
        Self::new(char, 0., 0., 0., [0.; 4])
    }

    /// The advance correction when `right` follows `left`, per em.
    ///
    /// Pairs are shared by all characters of a font, so any `CProp` of the font answers
    /// for any pair. Pairs that never occurred next to each other in the measured text are
    /// zero.
    pub fn dadv(&self, left: char, right: char) -> f64 {
        self.dadvs.get(&(left, right)).copied().unwrap_or(0.)
    }
}

/// How a [`CharacterTable`] obtains character metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Measurement {
    /// Read advances, ink boxes and kerning from the font tables.
    Tables,
    /// Shape bracketed strings and measure them, falling back to the font tables for
    /// fonts the backend cannot shape.
    #[default]
    Shaping,
}

/// Character metrics for every character used by a set of text elements.
///
/// Built once per document by [`TextContext`](crate::TextContext) and shared, read only,
/// by every [`ParsedText`](crate::text::ParsedText). Text added afterwards is not in the
/// table and has to be covered by building a new one.
pub struct CharacterTable {
    table: HashMap<Option<FontKey>, HashMap<char, CProp>>,
    cstys: HashMap<FontKey, HashMap<char, Option<FontKey>>>,
    true_styles: HashMap<FontKey, Option<FontKey>>,
    ascents: HashMap<FontKey, f64>,
    full_names: HashMap<FontKey, String>,
    elements: Vec<NodeId>,
}

impl fmt::Debug for CharacterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterTable")
            .field("styles", &self.table.len())
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

/// Characters found while walking the text, grouped by style.
#[derive(Default)]
struct Collected {
    /// Characters per true style.
    tstyset: HashMap<Option<FontKey>, HashSet<char>>,
    /// For each true style and character, the characters seen right before it.
    pchrset: HashMap<Option<FontKey>, HashMap<char, HashSet<char>>>,
    /// The true style of each character of each nominal style.
    cstys: HashMap<FontKey, HashMap<char, Option<FontKey>>>,
    true_styles: HashMap<FontKey, Option<FontKey>>,
}

impl CharacterTable {
    /// Builds the table for `elements` with the default measurement.
    pub fn build(doc: &Document, elements: &[NodeId], backend: &mut dyn FontBackend) -> Self {
        let measurement = if cfg!(feature = "shaping") {
            Measurement::Shaping
        } else {
            Measurement::Tables
        };
        Self::build_with(doc, elements, backend, measurement)
    }

    /// Builds the table for `elements`.
    pub fn build_with(
        doc: &Document,
        elements: &[NodeId],
        backend: &mut dyn FontBackend,
        measurement: Measurement,
    ) -> Self {
        let collected = collect_characters(doc, elements, backend);
        let mut table = HashMap::new();
        for (sty, chrs) in &collected.tstyset {
            let Some(font) = sty else {
                let props = chrs.iter().map(|&c| (c, CProp::zero(c))).collect();
                table.insert(None, props);
                continue;
            };
            let pchrs = collected.pchrset.get(sty);
            let props = match measurement {
                Measurement::Shaping => measure_characters(backend, font, chrs, pchrs)
                    .unwrap_or_else(|| {
                        log::warn!("could not shape {font}, reading its font tables instead");
                        extract_characters(backend, font, chrs, pchrs)
                    }),
                Measurement::Tables => extract_characters(backend, font, chrs, pchrs),
            };
            table.insert(sty.clone(), props);
        }

        let mut ret = Self {
            table,
            cstys: collected.cstys,
            true_styles: collected.true_styles,
            ascents: HashMap::new(),
            full_names: HashMap::new(),
            elements: elements.to_vec(),
        };
        ret.record_styles(doc, backend);
        ret
    }

    /// Records true fonts, ascents and names of every style used under the elements,
    /// including those of elements without text, which flowed layout still needs.
    fn record_styles(&mut self, doc: &Document, backend: &mut dyn FontBackend) {
        let mut nominal = HashSet::new();
        for &el in &self.elements {
            for d in doc.descendants(el) {
                nominal.insert(FontKey::from_style(&doc.specified_style(d)));
            }
        }
        for key in nominal {
            self.true_styles
                .entry(key.clone())
                .or_insert_with(|| backend.true_font(&key));
        }
        let fonts: HashSet<FontKey> = self
            .true_styles
            .values()
            .flatten()
            .chain(self.table.keys().flatten())
            .cloned()
            .collect();
        for font in fonts {
            let FontMetrics { ascent, .. } = backend.font_metrics(&font);
            self.ascents.insert(font.clone(), ascent);
            if let Some(name) = backend.full_name(&font) {
                self.full_names.insert(font, name);
            }
        }
    }

    /// The metrics of `ch` in the true font `sty`.
    ///
    /// Missing entries mean the text changed after the table was built. They are never
    /// substituted: the lookup fails with [`Error::MissingMetric`].
    pub fn get_prop(&self, ch: char, sty: Option<&FontKey>) -> Result<&CProp, Error> {
        let style = || sty.map_or_else(|| "none".to_owned(), FontKey::to_string);
        let Some(chars) = self.table.get(&sty.cloned()) else {
            let known: Vec<String> = self
                .table
                .keys()
                .map(|k| k.as_ref().map_or_else(|| "none".to_owned(), FontKey::to_string))
                .collect();
            log::debug!(
                "no style matches {}; the character table is outdated and has to be rebuilt. \
                 character: {ch:?}, existing styles: {known:?}",
                style()
            );
            return Err(Error::MissingMetric {
                style: style(),
                ch,
                known,
            });
        };
        chars.get(&ch).ok_or_else(|| {
            let mut known: Vec<String> = chars.keys().map(char::to_string).collect();
            known.sort();
            log::debug!(
                "no character matches {ch:?} in {}; the character table is outdated and has \
                 to be rebuilt. existing characters: {known:?}",
                style()
            );
            Error::MissingMetric {
                style: style(),
                ch,
                known,
            }
        })
    }

    /// The font a nominal font resolves to. `None` if the nominal font was never seen or
    /// matches nothing.
    pub fn true_style(&self, nominal: &FontKey) -> Option<&FontKey> {
        self.true_styles.get(nominal).and_then(Option::as_ref)
    }

    /// The font `ch` is drawn with when set in the nominal font, after fallback.
    pub fn char_style(&self, nominal: &FontKey, ch: char) -> Option<&FontKey> {
        self.cstys
            .get(nominal)
            .and_then(|m| m.get(&ch))
            .and_then(Option::as_ref)
    }

    /// Like [`CharacterTable::char_style`], but tells characters that were never
    /// recorded (`None`) from characters no font covers (`Some(None)`).
    pub(crate) fn char_style_entry(&self, nominal: &FontKey, ch: char) -> Option<Option<&FontKey>> {
        self.cstys.get(nominal)?.get(&ch).map(Option::as_ref)
    }

    /// The ascent of a true font, per em, with ascent and descent summing to one.
    pub fn flowy(&self, font: Option<&FontKey>) -> f64 {
        font.and_then(|f| self.ascents.get(f))
            .copied()
            .unwrap_or_else(|| FontMetrics::default().ascent)
    }

    /// The full face name of a true font, if the backend reported one.
    pub fn full_name(&self, font: &FontKey) -> Option<&str> {
        self.full_names.get(font).map(String::as_str)
    }

    /// The elements the table was built for.
    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }

    /// The true fonts in the table. `None` stands for characters no font covers.
    pub fn styles(&self) -> impl Iterator<Item = Option<&FontKey>> + '_ {
        self.table.keys().map(Option::as_ref)
    }

    /// All metrics of one true font.
    pub fn chars(&self, font: Option<&FontKey>) -> Option<&HashMap<char, CProp>> {
        self.table.get(&font.cloned())
    }
}

fn collect_characters(
    doc: &Document,
    elements: &[NodeId],
    backend: &mut dyn FontBackend,
) -> Collected {
    let mut fstyset: HashMap<FontKey, HashSet<char>> = HashMap::new();
    let mut txtfsty: Vec<(Vec<char>, FontKey)> = Vec::new();
    for &el in elements {
        let tree = TextTree::new(doc, el);
        for block in tree.blocks(doc, None) {
            let Some(txt) = block.text.filter(|t| !t.is_empty()) else {
                continue;
            };
            let fsty = FontKey::from_style(&doc.specified_style(block.sel));
            let set = fstyset.entry(fsty.clone()).or_default();
            set.extend(txt.chars());
            set.insert(' ');
            txtfsty.push((txt.chars().collect(), fsty));
        }
    }

    let mut ret = Collected::default();
    for (fsty, chrs) in &fstyset {
        let mut chrs: Vec<char> = chrs.iter().copied().collect();
        chrs.sort_unstable();
        let tfbc = backend.true_fonts_by_char(fsty, &chrs);
        let tsty = backend.true_font(fsty);
        ret.true_styles.insert(fsty.clone(), tsty.clone());
        ret.tstyset.entry(tsty).or_default().extend(chrs.iter().copied());
        for (&c, csty) in &tfbc {
            if let Some(csty) = csty {
                ret.cstys
                    .entry(csty.clone())
                    .or_default()
                    .insert(c, Some(csty.clone()));
            }
            let set = ret.tstyset.entry(csty.clone()).or_default();
            set.insert(c);
            set.insert(' ');
        }
        ret.cstys.entry(fsty.clone()).or_default().extend(tfbc);
    }

    for (txt, fsty) in &txtfsty {
        let cstys = &ret.cstys[fsty];
        for pair in txt.windows(2) {
            let (prev, c) = (pair[0], pair[1]);
            let csty = cstys.get(&c).cloned().flatten();
            let pset = ret.pchrset.entry(csty.clone()).or_default();
            if cstys.get(&prev).cloned().flatten() == csty {
                let s = pset.entry(c).or_default();
                s.insert(prev);
                s.insert(' ');
            }
        }
    }
    ret
}

/// Metrics read from the font tables.
fn extract_characters(
    backend: &mut dyn FontBackend,
    sty: &FontKey,
    chrs: &HashSet<char>,
    pchrs: Option<&HashMap<char, HashSet<char>>>,
) -> HashMap<char, CProp> {
    let mut bad: Vec<char> = chrs.iter().copied().filter(|c| BAD_CHARS.contains(c)).collect();
    let mut good: Vec<char> = chrs.iter().copied().filter(|c| !BAD_CHARS.contains(c)).collect();
    good.sort_unstable();

    let mut fntcs: HashMap<FontKey, Vec<char>> = HashMap::new();
    for (c, fnt) in backend.true_fonts_by_char(sty, &good) {
        match fnt {
            Some(fnt) => fntcs.entry(fnt).or_default().push(c),
            None => bad.push(c),
        }
    }

    let mut ret: HashMap<char, CProp> = HashMap::new();
    for (fnt, mut chs) in fntcs {
        chs.sort_unstable();
        let preceding: HashMap<char, HashSet<char>> = pchrs
            .map(|p| {
                p.iter()
                    .filter(|(k, _)| chs.contains(k))
                    .map(|(&k, v)| (k, v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let Some(gm) = backend.glyph_metrics(&fnt, &chs, &preceding) else {
            log::warn!("could not read the font tables of {fnt}");
            bad.extend(chs);
            continue;
        };
        let dadvs = Arc::new(gm.pair_deltas);
        for c in chs {
            ret.insert(
                c,
                CProp {
                    char: c,
                    charw: gm.advances.get(&c).copied().unwrap_or(0.),
                    spacew: 0.,
                    caph: gm.cap_height,
                    inkbb: gm.ink.get(&c).copied().unwrap_or([0.; 4]),
                    dadvs: Arc::clone(&dadvs),
                },
            );
        }
    }

    let (spacew, caph) = ret.get(&' ').map_or((0., 0.), |s| (s.charw, s.caph));
    for p in ret.values_mut() {
        p.spacew = spacew;
        p.caph = caph;
    }
    for c in bad {
        ret.insert(c, CProp::new(c, 0., spacew, caph, [0.; 4]));
    }
    ret
}

/// Replaces characters that cannot be shaped on their own.
fn effc(c: char) -> char {
    if BAD_CHARS.contains(&c) { ' ' } else { c }
}

/// Metrics from shaping each character between two bracket strings.
///
/// The brackets cancel out bearings at the ends of a shaped run, so the width of the
/// bracketed string minus the width of the brackets alone is the character's logical
/// advance. Returns `None` if the backend cannot shape the font.
fn measure_characters(
    backend: &mut dyn FontBackend,
    sty: &FontKey,
    chrs: &HashSet<char>,
    pchrs: Option<&HashMap<char, HashSet<char>>>,
) -> Option<HashMap<char, CProp>> {
    let bufc = ['=', 'M', 'A']
        .into_iter()
        .find(|&c| backend.covers(sty, c))
        .unwrap_or('=');
    let prefix = format!("I{bufc}");
    let suffix = format!("{bufc}I");
    let empty = format!("{prefix}{suffix}");

    let mut chars: Vec<char> = chrs.iter().copied().collect();
    chars.sort_unstable();
    // Strings are laid out as: empty, then per character its bracketed and bare forms.
    let mut strings = vec![empty.clone()];
    for &c in &chars {
        strings.push(format!("{prefix}{}{suffix}", effc(c)));
        strings.push(effc(c).to_string());
    }
    let mut pairs = Vec::new();
    for &c in &chars {
        let Some(before) = pchrs.and_then(|p| p.get(&c)) else {
            continue;
        };
        let mut before: Vec<char> = before.iter().copied().filter(|p| chrs.contains(p)).collect();
        before.sort_unstable();
        for p in before {
            strings.push(format!("{prefix}{}{}{suffix}", effc(p), effc(c)));
            pairs.push((p, c));
        }
    }

    let metrics: Vec<StringMetrics> = {
        let _guard = MEASURE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        backend.measure_strings(sty, &strings)?
    };
    if metrics.len() != strings.len() {
        return None;
    }

    let we = metrics[0].advance;
    let bracketed = |i: usize| metrics[1 + 2 * i].advance - we;
    let index: HashMap<char, usize> = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    let spw = index.get(&' ').map_or(0., |&i| bracketed(i));
    let caph = -metrics[0].ink[1];

    let mut dadvs = HashMap::new();
    let pair_start = 1 + 2 * chars.len();
    for (k, &(p, c)) in pairs.iter().enumerate() {
        let both = metrics[pair_start + k].advance - we;
        dadvs.insert((p, c), both - bracketed(index[&p]) - bracketed(index[&c]));
    }
    let dadvs = Arc::new(dadvs);

    let ret = chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let charw = if BAD_CHARS.contains(&c) { 0. } else { bracketed(i) };
            let prop = CProp {
                char: c,
                charw,
                spacew: spw,
                caph,
                inkbb: metrics[2 + 2 * i].ink,
                dadvs: Arc::clone(&dadvs),
            };
            (c, prop)
        })
        .collect();
    Some(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedFonts;

    const SVG: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
        r#"<text id="t" style="font-family:Fixed">AV i<tspan style="font-weight:bold">W</tspan></text>"#,
        "</svg>"
    );

    #[test]
    fn measured_and_extracted_tables_agree() {
        let doc = Document::parse(SVG).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let mut fonts = FixedFonts::new().with_kerning('A', 'V', -0.1);
        let ext = CharacterTable::build_with(&doc, &[t], &mut fonts, Measurement::Tables);
        let mea = CharacterTable::build_with(&doc, &[t], &mut fonts, Measurement::Shaping);
        let regular = FontKey::from_style(&crate::dom::Style::parse("font-family:Fixed"));
        let tsty = ext.true_style(&regular).cloned();
        for c in ['A', 'V', ' ', 'i'] {
            let a = ext.get_prop(c, tsty.as_ref()).unwrap();
            let b = mea.get_prop(c, tsty.as_ref()).unwrap();
            assert!((a.charw - b.charw).abs() < 1e-9, "advance of {c:?}");
            assert!((a.spacew - b.spacew).abs() < 1e-9);
        }
        let a = ext.get_prop('V', tsty.as_ref()).unwrap();
        let b = mea.get_prop('V', tsty.as_ref()).unwrap();
        assert!((a.dadv('A', 'V') + 0.1).abs() < 1e-9);
        assert!((b.dadv('A', 'V') + 0.1).abs() < 1e-9);
        assert_eq!(a.dadv('V', 'A'), 0.);
    }

    #[test]
    fn missing_metrics_are_errors() {
        let doc = Document::parse(SVG).unwrap();
        let t = doc.element_by_id("t").unwrap();
        let table = CharacterTable::build(&doc, &[t], &mut FixedFonts::new());
        let regular = FontKey::from_style(&crate::dom::Style::parse("font-family:Fixed"));
        let tsty = table.true_style(&regular).cloned();
        let err = table.get_prop('Q', tsty.as_ref()).unwrap_err();
        assert!(matches!(err, Error::MissingMetric { ch: 'Q', .. }));
        let other = FontKey::from_style(&crate::dom::Style::parse("font-family:Nope"));
        assert!(matches!(
            table.get_prop('A', Some(&other)),
            Err(Error::MissingMetric { .. })
        ));
    }

    #[test]
    fn uncovered_characters_have_no_advance() {
        let doc = Document::parse(concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
            "<text id=\"t\">a\u{1F600}b</text></svg>"
        ))
        .unwrap();
        let t = doc.element_by_id("t").unwrap();
        let mut fonts = FixedFonts::new().with_missing('\u{1F600}');
        let table = CharacterTable::build(&doc, &[t], &mut fonts);
        let p = table.get_prop('\u{1F600}', None).unwrap();
        assert_eq!(p.charw, 0.);
    }
}
