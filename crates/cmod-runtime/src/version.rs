//! Version numbers and version constraints.
//!
//! A version is a dot-separated sequence of numeric segments (`1.6.8`). Every
//! segment is bounded to `0..=999`, so a version can be encoded as a single
//! integer in which each segment occupies three decimal digits:
//!
//! ```text
//! 1.6.8     => 1006008
//! 900.0.999 => 900000999
//! ```
//!
//! The segment count a version was parsed with is kept alongside the encoded
//! value. Formatting uses that count instead of guessing it from the encoded
//! magnitude, so `0.1.0` formats back to `0.1.0` rather than `1.0`.
//! Comparisons pad both sides with trailing zero segments, which makes
//! `1.0` and `1.0.0` equal.

use crate::error::{RuntimeError, RuntimeResult};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Largest value a single segment may carry.
pub const MAX_SEGMENT: u64 = 999;

/// Maximum number of segments in a version string.
pub const MAX_SEGMENTS: usize = 6;

const SEGMENT_BASE: u64 = MAX_SEGMENT + 1;

/// A parsed, immutable version number.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    encoded: u64,
    segments: u8,
}

impl Version {
    /// Parse a dot-separated version string.
    pub fn parse(text: &str) -> RuntimeResult<Self> {
        if text.is_empty() {
            return Err(RuntimeError::InvalidVersionFormat(
                "version string is empty".to_string(),
            ));
        }

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() > MAX_SEGMENTS {
            return Err(RuntimeError::InvalidVersionFormat(format!(
                "version '{text}' has more than {MAX_SEGMENTS} segments"
            )));
        }

        let mut encoded = 0;
        for part in &parts {
            encoded = encoded * SEGMENT_BASE + parse_segment(text, part)?;
        }

        Ok(Self {
            encoded,
            segments: parts.len() as u8,
        })
    }

    /// The integer encoding for the parsed segment count (`1.6.8` => `1006008`).
    pub fn encoded(&self) -> u64 {
        self.encoded
    }

    /// Number of segments the version was parsed with.
    pub fn segment_count(&self) -> usize {
        self.segments as usize
    }

    /// The individual segments, most significant first.
    pub fn segments(&self) -> Vec<u64> {
        let mut out = vec![0; self.segment_count()];
        let mut rest = self.encoded;
        for slot in out.iter_mut().rev() {
            *slot = rest % SEGMENT_BASE;
            rest /= SEGMENT_BASE;
        }
        out
    }

    /// Evaluate `self <operator> other`.
    pub fn compare(&self, operator: Operator, other: &Version) -> bool {
        operator.holds(self.cmp(other))
    }

    /// Encoding padded to [`MAX_SEGMENTS`] segments, used for ordering.
    fn canonical(&self) -> u64 {
        let padding = (MAX_SEGMENTS - self.segment_count()) as u32;
        self.encoded * SEGMENT_BASE.pow(padding)
    }
}

fn parse_segment(text: &str, part: &str) -> RuntimeResult<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RuntimeError::InvalidVersionFormat(format!(
            "version-part '{part}' of '{text}' is not a non-negative number"
        )));
    }

    let value = part.parse::<u64>().unwrap_or(u64::MAX);
    if value > MAX_SEGMENT {
        return Err(RuntimeError::InvalidVersionFormat(format!(
            "version-part '{part}' of '{text}' too large (max. {MAX_SEGMENT})"
        )));
    }

    Ok(value)
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .segments()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&text)
    }
}

impl FromStr for Version {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Comparison operator of a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `=` or no operator at all.
    #[default]
    Equal,
    /// `!=` or `!`
    NotEqual,
}

// Two-character operators come first so `<=` is never read as `<` + `=1.0`.
const OPERATOR_PREFIXES: [(&str, Operator); 7] = [
    ("<=", Operator::LessOrEqual),
    (">=", Operator::GreaterOrEqual),
    ("!=", Operator::NotEqual),
    ("<", Operator::Less),
    (">", Operator::Greater),
    ("=", Operator::Equal),
    ("!", Operator::NotEqual),
];

impl Operator {
    /// Split a leading operator off `text`; no operator means [`Operator::Equal`].
    pub fn split_prefix(text: &str) -> (Operator, &str) {
        OPERATOR_PREFIXES
            .iter()
            .find_map(|(prefix, op)| text.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Equal, text))
    }

    /// Canonical symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
        }
    }

    /// Whether `ordering` (left compared to right) satisfies the operator.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Less => ordering == Ordering::Less,
            Operator::LessOrEqual => ordering != Ordering::Greater,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::GreaterOrEqual => ordering != Ordering::Less,
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An operator paired with a version, e.g. `>=1.2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub operator: Operator,
    pub version: Version,
}

impl Constraint {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self { operator, version }
    }

    /// Parse `<op><version>`.
    pub fn parse(text: &str) -> RuntimeResult<Self> {
        let (operator, rest) = Operator::split_prefix(text.trim());
        let version = Version::parse(rest)?;
        Ok(Self { operator, version })
    }

    /// Whether `candidate <op> self.version` holds.
    pub fn is_satisfied_by(&self, candidate: &Version) -> bool {
        candidate.compare(self.operator, &self.version)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

impl FromStr for Constraint {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Conjunction of all constraints. An empty set is always satisfied.
pub fn all_satisfy(constraints: &[Constraint], candidate: &Version) -> bool {
    constraints.iter().all(|c| c.is_satisfied_by(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn test_encoding() {
        assert_eq!(v("1.6.8").encoded(), 1_006_008);
        assert_eq!(v("900.0.999").encoded(), 900_000_999);
        assert_eq!(v("7").encoded(), 7);
    }

    #[test]
    fn test_round_trip_keeps_segment_count() {
        for text in ["1.0.0", "0.1.0", "0.0.1", "12.345.6", "3", "1.2.3.4.5.6"] {
            assert_eq!(v(text).to_string(), text);
        }
    }

    #[test]
    fn test_leading_zeros_are_normalized() {
        assert_eq!(v("01.002.3").to_string(), "1.2.3");
    }

    #[test]
    fn test_invalid_versions() {
        for text in ["", "1..0", "a.b", "1.-1", "1.1000", "+1.0", " 1.0", "1.2.3.4.5.6.7"] {
            assert!(
                matches!(Version::parse(text), Err(RuntimeError::InvalidVersionFormat(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_ordering_same_arity() {
        assert!(v("1.10.0") > v("1.9.999"));
        assert!(v("2.0.0").compare(Operator::Greater, &v("1.999.999")));
        assert!(!v("1.999.999").compare(Operator::Greater, &v("2.0.0")));
    }

    /// Every tuple of `arity` segments drawn from `values`.
    fn tuples(arity: usize, values: &[u64]) -> Vec<Vec<u64>> {
        (0..arity).fold(vec![Vec::new()], |acc, _| {
            acc.iter()
                .flat_map(|prefix| {
                    values.iter().map(move |&value| {
                        let mut next = prefix.clone();
                        next.push(value);
                        next
                    })
                })
                .collect()
        })
    }

    fn join(segments: &[u64]) -> String {
        segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    #[test]
    fn test_generated_round_trip() {
        for arity in 1..=MAX_SEGMENTS {
            let values: &[u64] = if arity <= 3 {
                &[0, 1, 9, 10, 99, 100, 998, MAX_SEGMENT]
            } else {
                &[0, 7, MAX_SEGMENT]
            };
            for segments in tuples(arity, values) {
                let text = join(&segments);
                let version = v(&text);
                assert_eq!(version.to_string(), text);
                assert_eq!(version.segments(), segments);
            }
        }
    }

    #[test]
    fn test_generated_ordering_matches_segments() {
        for arity in 1..=3 {
            let all = tuples(arity, &[0, 1, 9, 10, 500, MAX_SEGMENT]);
            for a in &all {
                let greater = Constraint::parse(&format!(">{}", join(a))).unwrap();
                let less = Constraint::parse(&format!("<{}", join(a))).unwrap();
                for b in &all {
                    let version = v(&join(b));
                    // Same-arity vectors order lexicographically.
                    assert_eq!(greater.is_satisfied_by(&version), b > a, "{b:?} > {a:?}");
                    assert_eq!(less.is_satisfied_by(&version), b < a, "{b:?} < {a:?}");
                    assert_eq!(version.cmp(&v(&join(a))), b.cmp(a));
                }
            }
        }
    }

    #[test]
    fn test_mixed_arity_compares_segment_wise() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("2.0") > v("1.5.0"));
    }

    #[test]
    fn test_operator_prefixes() {
        assert_eq!(Operator::split_prefix("<=1.0"), (Operator::LessOrEqual, "1.0"));
        assert_eq!(Operator::split_prefix("!1.0"), (Operator::NotEqual, "1.0"));
        assert_eq!(Operator::split_prefix("!=1.0"), (Operator::NotEqual, "1.0"));
        assert_eq!(Operator::split_prefix("1.0"), (Operator::Equal, "1.0"));
    }

    #[test]
    fn test_constraint_conjunction() {
        let constraints = vec![
            Constraint::parse(">1.0.0").unwrap(),
            Constraint::parse("<2.0.0").unwrap(),
        ];

        assert!(all_satisfy(&constraints, &v("1.5.0")));
        assert!(!all_satisfy(&constraints, &v("2.0.0")));
        assert!(!all_satisfy(&constraints, &v("0.9.0")));
        assert!(all_satisfy(&[], &v("0.9.0")));
    }

    #[test]
    fn test_invalid_constraint() {
        assert!(Constraint::parse("=>1.0").is_err());
        assert!(Constraint::parse("~1.0").is_err());
        assert!(Constraint::parse(">=").is_err());
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(Constraint::parse("1.2.0").unwrap().to_string(), "=1.2.0");
        assert_eq!(Constraint::parse("!1.2").unwrap().to_string(), "!=1.2");
    }
}
