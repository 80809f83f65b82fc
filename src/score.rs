//! Normalization of critic scores into the `[0, 1]` range.
//!
//! Two notations show up on review listings: fractions (`3/4`, `3.5/5`) and letter grades
//! (`A` to `F`, optionally followed by `+` or `-`). Anything else is kept verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized review score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    /// Normalized value. Fractions are not clamped, so malformed input like `5/4` yields `1.25`.
    Value(f64),
    /// Score that could not be parsed, passed through unchanged.
    Raw(String),
}

impl Score {
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Value(v) => Some(*v),
            Score::Raw(_) => None,
        }
    }

    /// `true` for a numeric score outside `[0, 1]`.
    pub fn is_out_of_range(&self) -> bool {
        self.value().is_some_and(|v| !(0.0..=1.0).contains(&v))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Value(v) => write!(f, "{v}"),
            Score::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Converts a raw score string into a [`Score`]. `None` or blank input means "no score".
pub fn normalize(raw: Option<&str>) -> Option<Score> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = if raw.contains('/') {
        parse_fraction(raw)
    } else {
        parse_letter_grade(raw)
    };

    Some(match parsed {
        Some(v) => Score::Value(v),
        None => Score::Raw(raw.to_string()),
    })
}

fn parse_fraction(raw: &str) -> Option<f64> {
    let (num, denom) = raw.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let denom: f64 = denom.trim().parse().ok()?;
    if !num.is_finite() || !denom.is_finite() || denom == 0.0 {
        return None;
    }
    Some(num / denom).filter(|v| v.is_finite())
}

fn parse_letter_grade(raw: &str) -> Option<f64> {
    let grade = raw.to_ascii_lowercase();
    if grade == "a" {
        return Some(1.0);
    }

    let mut chars = grade.chars();
    // Grades are kept in tenths so that e.g. `C-` lands exactly on 0.3.
    let base: i32 = match chars.next()? {
        'a' => 8,
        'b' => 6,
        'c' => 4,
        'd' => 2,
        'f' => 0,
        _ => return None,
    };
    let modifier = match chars.next() {
        None => 0,
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };
    if chars.next().is_some() {
        return None;
    }

    Some(f64::from(base + modifier) / 10.0)
}
