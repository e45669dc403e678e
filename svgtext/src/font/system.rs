// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use fontique::{Collection, CollectionOptions, QueryFamily, QueryFont, QueryStatus, SourceCache};
use hashbrown::{HashMap, HashSet};
use kurbo::Rect;
use read_fonts::TableProvider as _;
use skrifa::instance::{LocationRef, Size};
use skrifa::string::StringId;
use skrifa::MetadataProvider as _;
use svgtext_primitives::{
    FamilyList, FamilyName, FontStyle, FontWeight, FontWidth, GenericFamily,
};

use super::{FontBackend, FontKey, FontMetrics, GlyphMetrics, StringMetrics};

/// Generic families tried, in order, for characters the requested families lack.
const FALLBACK_GENERICS: [GenericFamily; 6] = [
    GenericFamily::SansSerif,
    GenericFamily::Serif,
    GenericFamily::Monospace,
    GenericFamily::SystemUi,
    GenericFamily::Emoji,
    GenericFamily::Math,
];

/// A font backend over the fonts installed on the system.
///
/// Matching goes through a [`fontique`] collection. Metrics are read with `skrifa` and
/// `read-fonts`, and strings are shaped with `harfrust`.
pub struct SystemFonts {
    collection: Collection,
    source_cache: SourceCache,
    candidates: HashMap<FontKey, Vec<QueryFont>>,
    faces: HashMap<FontKey, QueryFont>,
    shapers: HashMap<FontKey, harfrust::ShaperData>,
}

impl fmt::Debug for SystemFonts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFonts")
            .field("faces", &self.faces.len())
            .finish_non_exhaustive()
    }
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::new()
    }
}

fn to_fontique_generic(g: GenericFamily) -> fontique::GenericFamily {
    match g {
        GenericFamily::Serif => fontique::GenericFamily::Serif,
        GenericFamily::SansSerif => fontique::GenericFamily::SansSerif,
        GenericFamily::Monospace => fontique::GenericFamily::Monospace,
        GenericFamily::Cursive => fontique::GenericFamily::Cursive,
        GenericFamily::Fantasy => fontique::GenericFamily::Fantasy,
        GenericFamily::SystemUi => fontique::GenericFamily::SystemUi,
        GenericFamily::Emoji => fontique::GenericFamily::Emoji,
        GenericFamily::Math => fontique::GenericFamily::Math,
    }
}

fn to_attributes(key: &FontKey) -> fontique::Attributes {
    fontique::Attributes {
        width: fontique::FontWidth::from_ratio(key.width.ratio()),
        style: match key.style {
            FontStyle::Normal => fontique::FontStyle::Normal,
            FontStyle::Italic => fontique::FontStyle::Italic,
            FontStyle::Oblique => fontique::FontStyle::Oblique(None),
        },
        weight: fontique::FontWeight::new(key.weight.value()),
    }
}

fn covers_char(font: &QueryFont, ch: char) -> bool {
    skrifa::FontRef::from_index(font.blob.as_ref(), font.index)
        .is_ok_and(|f| f.charmap().map(ch).is_some())
}

fn units_per_em(data: &[u8], index: u32) -> Option<f64> {
    let font = read_fonts::FontRef::from_index(data, index).ok()?;
    let upem = font.head().ok()?.units_per_em();
    (upem > 0).then(|| f64::from(upem))
}

impl SystemFonts {
    /// Creates a backend over the system's fonts.
    pub fn new() -> Self {
        Self {
            collection: Collection::new(CollectionOptions {
                shared: false,
                system_fonts: true,
            }),
            source_cache: SourceCache::default(),
            candidates: HashMap::new(),
            faces: HashMap::new(),
            shapers: HashMap::new(),
        }
    }

    /// Fonts that match `nominal`, in preference order: its own families first, then the
    /// generic fallbacks.
    fn candidates(&mut self, nominal: &FontKey) -> Vec<QueryFont> {
        if let Some(c) = self.candidates.get(nominal) {
            return c.clone();
        }
        let mut families: Vec<QueryFamily<'_>> = nominal
            .family
            .families()
            .iter()
            .map(|f| match f {
                FamilyName::Named(name) => QueryFamily::Named(name.as_str()),
                FamilyName::Generic(g) => QueryFamily::Generic(to_fontique_generic(*g)),
            })
            .collect();
        families.extend(
            FALLBACK_GENERICS
                .iter()
                .map(|&g| QueryFamily::Generic(to_fontique_generic(g))),
        );
        let mut found = Vec::new();
        let mut query = self.collection.query(&mut self.source_cache);
        query.set_families(families);
        query.set_attributes(to_attributes(nominal));
        query.matches_with(|font| {
            found.push(font.clone());
            QueryStatus::Continue
        });
        drop(query);

        let mut seen = HashSet::new();
        found.retain(|f| seen.insert((f.blob.id(), f.index)));
        for font in &found {
            if let Some(key) = self.key_of(font) {
                self.faces.entry(key).or_insert_with(|| font.clone());
            }
        }
        self.candidates.insert(nominal.clone(), found.clone());
        found
    }

    /// The key describing a matched face.
    fn key_of(&mut self, font: &QueryFont) -> Option<FontKey> {
        let (family_id, index) = font.family;
        let family = self.collection.family(family_id)?;
        let info = family.fonts().get(index)?;
        let style = match info.style() {
            fontique::FontStyle::Normal => FontStyle::Normal,
            fontique::FontStyle::Italic => FontStyle::Italic,
            fontique::FontStyle::Oblique(_) => FontStyle::Oblique,
        };
        Some(FontKey::new(
            FamilyList::single(FamilyName::Named(family.name().to_owned())),
            FontWeight::new(info.weight().value()),
            style,
            FontWidth::from_ratio(info.width().ratio()),
        ))
    }

    fn face(&self, font: &FontKey) -> Option<&QueryFont> {
        self.faces.get(font)
    }

    /// Shapes `text` and returns the advance and the ink box, in font units.
    fn shape(&mut self, font: &FontKey, text: &str) -> Option<(f64, Option<Rect>)> {
        let face = self.faces.get(font)?;
        let data = face.blob.as_ref();
        let font_ref = harfrust::FontRef::from_index(data, face.index).ok()?;
        let shaper_data = self
            .shapers
            .entry(font.clone())
            .or_insert_with(|| harfrust::ShaperData::new(&font_ref));
        let shaper = shaper_data.shaper(&font_ref).build();
        let mut buffer = harfrust::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let glyphs = shaper.shape(buffer, &[]);

        let metrics_font = skrifa::FontRef::from_index(data, face.index).ok()?;
        let gm = metrics_font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let mut pen = 0.;
        let mut ink: Option<Rect> = None;
        for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
            let gid = skrifa::GlyphId::new(info.glyph_id);
            if let Some(b) = gm.bounds(gid) {
                let x = pen + f64::from(pos.x_offset);
                let y = f64::from(pos.y_offset);
                let r = Rect::new(
                    x + f64::from(b.x_min),
                    -(y + f64::from(b.y_max)),
                    x + f64::from(b.x_max),
                    -(y + f64::from(b.y_min)),
                );
                if r.area() > 0. {
                    ink = Some(ink.map_or(r, |i| i.union(r)));
                }
            }
            pen += f64::from(pos.x_advance);
        }
        Some((pen, ink))
    }
}

impl FontBackend for SystemFonts {
    fn true_font(&mut self, nominal: &FontKey) -> Option<FontKey> {
        let first = self.candidates(nominal).into_iter().next()?;
        self.key_of(&first)
    }

    fn true_fonts_by_char(
        &mut self,
        nominal: &FontKey,
        chars: &[char],
    ) -> HashMap<char, Option<FontKey>> {
        let candidates = self.candidates(nominal);
        let keys: Vec<Option<FontKey>> = candidates.iter().map(|f| self.key_of(f)).collect();
        chars
            .iter()
            .map(|&c| {
                let key = candidates
                    .iter()
                    .zip(&keys)
                    .find(|(f, _)| covers_char(f, c))
                    .and_then(|(_, k)| k.clone());
                (c, key)
            })
            .collect()
    }

    fn font_metrics(&mut self, font: &FontKey) -> FontMetrics {
        let Some(face) = self.face(font) else {
            return FontMetrics::default();
        };
        let data = face.blob.as_ref();
        let Ok(rf) = read_fonts::FontRef::from_index(data, face.index) else {
            return FontMetrics::default();
        };
        let Some(upem) = units_per_em(data, face.index) else {
            return FontMetrics::default();
        };
        let (asc, desc, cap) = match rf.os2() {
            Ok(os2) => (
                f64::from(os2.s_typo_ascender()),
                f64::from(os2.s_typo_descender()),
                os2.s_cap_height().map(f64::from),
            ),
            Err(_) => match rf.hhea() {
                Ok(hhea) => (
                    f64::from(hhea.ascender().to_i16()),
                    f64::from(hhea.descender().to_i16()),
                    None,
                ),
                Err(_) => return FontMetrics::default(),
            },
        };
        let cap = cap.filter(|c| *c > 0.).or_else(|| {
            let sf = skrifa::FontRef::from_index(data, face.index).ok()?;
            let gid = sf.charmap().map('I')?;
            let b = sf
                .glyph_metrics(Size::unscaled(), LocationRef::default())
                .bounds(gid)?;
            Some(f64::from(b.y_max))
        });
        let span = asc - desc;
        if span <= 0. {
            return FontMetrics::default();
        }
        FontMetrics {
            ascent: asc / span,
            descent: -desc / span,
            cap_height: cap.map_or(1., |c| c / upem),
        }
    }

    fn glyph_metrics(
        &mut self,
        font: &FontKey,
        chars: &[char],
        preceding: &HashMap<char, HashSet<char>>,
    ) -> Option<GlyphMetrics> {
        let face = self.face(font)?.clone();
        let data = face.blob.as_ref();
        let upem = units_per_em(data, face.index)?;
        let sf = skrifa::FontRef::from_index(data, face.index).ok()?;
        let charmap = sf.charmap();
        let gm = sf.glyph_metrics(Size::unscaled(), LocationRef::default());

        let mut ret = GlyphMetrics {
            cap_height: self.font_metrics(font).cap_height,
            ..GlyphMetrics::default()
        };
        for &c in chars {
            let gid = charmap.map(c);
            let adv = gid.and_then(|g| gm.advance_width(g)).map_or(0., f64::from);
            ret.advances.insert(c, adv / upem);
            let ink = gid.and_then(|g| gm.bounds(g)).map_or([0.; 4], |b| {
                [
                    f64::from(b.x_min) / upem,
                    -f64::from(b.y_max) / upem,
                    f64::from(b.x_max - b.x_min) / upem,
                    f64::from(b.y_max - b.y_min) / upem,
                ]
            });
            ret.ink.insert(c, ink);
        }

        let mut single = HashMap::new();
        for (&c, before) in preceding {
            for &p in before {
                let mut adv = |s: char, me: &mut Self| -> Option<f64> {
                    if let Some(&a) = single.get(&s) {
                        return Some(a);
                    }
                    let a = me.shape(font, &s.to_string())?.0;
                    single.insert(s, a);
                    Some(a)
                };
                let (Some(ap), Some(ac)) = (adv(p, self), adv(c, self)) else {
                    continue;
                };
                let Some((both, _)) = self.shape(font, &format!("{p}{c}")) else {
                    continue;
                };
                let delta = (both - ap - ac) / upem;
                if delta != 0. {
                    ret.pair_deltas.insert((p, c), delta);
                }
            }
        }
        Some(ret)
    }

    fn covers(&mut self, font: &FontKey, ch: char) -> bool {
        self.face(font).is_some_and(|f| covers_char(f, ch))
    }

    fn full_name(&mut self, font: &FontKey) -> Option<String> {
        let face = self.face(font)?;
        let sf = skrifa::FontRef::from_index(face.blob.as_ref(), face.index).ok()?;
        let name = sf
            .localized_strings(StringId::FULL_NAME)
            .english_or_first()?;
        Some(name.to_string())
    }

    fn measure_strings(
        &mut self,
        font: &FontKey,
        strings: &[String],
    ) -> Option<Vec<StringMetrics>> {
        if !cfg!(feature = "shaping") {
            return None;
        }
        let face = self.face(font)?.clone();
        let upem = units_per_em(face.blob.as_ref(), face.index)?;
        if strings.iter().flat_map(|s| s.chars()).any(|c| !covers_char(&face, c)) {
            return None;
        }
        let mut ret = Vec::with_capacity(strings.len());
        for s in strings {
            let (advance, ink) = self.shape(font, s)?;
            let ink = ink.map_or([0.; 4], |r| {
                [r.x0 / upem, r.y0 / upem, r.width() / upem, r.height() / upem]
            });
            ret.push(StringMetrics {
                advance: advance / upem,
                ink,
            });
        }
        Some(ret)
    }
}
