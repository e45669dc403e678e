// Copyright 2025 the Svgtext Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Misc helpers.

/// Positions closer than this are treated as unchanged by the edit operations.
pub(crate) const POSITION_TOLERANCE: f64 = 1e-3;

/// Number of characters in `s`. Character indices into text and tail strings count
/// `char`s, not bytes.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Characters `start..end` of `s`, clamped to its length.
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

/// `s` without its character at `ind`.
pub(crate) fn remove_char(s: &str, ind: usize) -> String {
    s.chars()
        .enumerate()
        .filter_map(|(i, c)| (i != ind).then_some(c))
        .collect()
}

/// `s` with `ins` inserted before its character at `ind`.
pub(crate) fn insert_at(s: &str, ind: usize, ins: &str) -> String {
    let mut out = String::with_capacity(s.len() + ins.len());
    let mut inserted = false;
    for (i, c) in s.chars().enumerate() {
        if i == ind {
            out.push_str(ins);
            inserted = true;
        }
        out.push(c);
    }
    if !inserted {
        out.push_str(ins);
    }
    out
}

/// Sorted values with near-duplicates (within `tol` of the last kept value) removed.
pub(crate) fn unique_tol(values: &[f64], tol: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    let mut ret: Vec<f64> = Vec::with_capacity(sorted.len());
    for v in sorted {
        match ret.last() {
            Some(last) if (v - last).abs() <= tol => {}
            _ => ret.push(v),
        }
    }
    ret
}

/// `list` with trailing entries equal to `val` removed, or `None` if nothing is left.
pub(crate) fn trim_trailing<T: PartialEq + Clone>(list: &[T], val: &T) -> Option<Vec<T>> {
    let keep = list.iter().rposition(|v| v != val).map_or(0, |i| i + 1);
    (keep > 0).then(|| list[..keep].to_vec())
}

/// Writes a list of positions the way `x`, `y`, `dx` and `dy` attributes hold them.
///
/// Missing entries are written as `none`.
pub(crate) fn format_positions(vals: &[Option<f64>]) -> String {
    let mut out = String::new();
    for (i, v) in vals.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match v {
            Some(v) => out.push_str(&format_coord(*v)),
            None => out.push_str("none"),
        }
    }
    out
}

/// Formats a number with at most two decimals and no trailing zeros.
pub(crate) fn format_short(v: f64) -> String {
    format_decimals(v, 2)
}

/// Formats a coordinate for an attribute, dropping float noise past the sixth decimal.
pub(crate) fn format_coord(v: f64) -> String {
    format_decimals(v, 6)
}

fn format_decimals(v: f64, decimals: usize) -> String {
    let s = format!("{v:.decimals$}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_editing_counts_chars() {
        assert_eq!(remove_char("héllo", 1), "hllo");
        assert_eq!(insert_at("héllo", 2, "XY"), "héXYllo");
        assert_eq!(insert_at("ab", 2, "c"), "abc");
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("ab", 1, 9), "b");
        assert_eq!(char_len("héllo"), 5);
    }

    #[test]
    fn trailing_values_are_trimmed() {
        assert_eq!(trim_trailing(&[1.0, 0.0, 2.0, 0.0, 0.0], &0.0), Some(vec![1.0, 0.0, 2.0]));
        assert_eq!(trim_trailing(&[0.0, 0.0], &0.0), None);
        assert_eq!(trim_trailing(&[Some(1.0), None], &None), Some(vec![Some(1.0)]));
    }

    #[test]
    fn unique_with_tolerance() {
        assert_eq!(unique_tol(&[3.0, 1.0, 1.0005, 2.0], 1e-3), vec![1.0, 2.0, 3.0]);
        assert!(unique_tol(&[], 1.0).is_empty());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_positions(&[Some(1.5), None, Some(-2.0)]), "1.5 none -2");
        assert_eq!(format_short(65.0), "65");
        assert_eq!(format_short(83.333), "83.33");
        assert_eq!(format_short(50.5), "50.5");
        assert_eq!(format_coord(6.999999999999993), "7");
        assert_eq!(format_coord(-1e-9), "0");
        assert_eq!(format_coord(12.25), "12.25");
        assert_eq!(format_positions(&[Some(0.1 + 0.2)]), "0.3");
    }
}
