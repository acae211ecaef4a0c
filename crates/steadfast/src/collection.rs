//! Collection Verification
//!
//! Compares an expected list of strings (typically dropdown option texts)
//! against what the page shows. Unordered comparison sorts both sides by
//! code point so the verdict and the rendered diff are deterministic.
//!
//! Empty entries count toward the verdict but are left out of the rendered
//! lists, which keeps the report readable for placeholder options.

use serde::Serialize;
use std::collections::BTreeMap;

/// Result of one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDiff {
    expected: Vec<String>,
    actual: Vec<String>,
    equal: bool,
    order_sensitive: bool,
}

/// Compare two sequences.
///
/// When `order_sensitive` is false both sides are sorted by ordinal order first.
#[must_use]
pub fn compare<E, A>(expected: E, actual: A, order_sensitive: bool) -> CollectionDiff
where
    E: IntoIterator,
    E::Item: Into<String>,
    A: IntoIterator,
    A::Item: Into<String>,
{
    let mut expected: Vec<String> = expected.into_iter().map(Into::into).collect();
    let mut actual: Vec<String> = actual.into_iter().map(Into::into).collect();
    if !order_sensitive {
        expected.sort();
        actual.sort();
    }
    let equal = expected == actual;
    tracing::debug!(
        expected = expected.len(),
        actual = actual.len(),
        order_sensitive,
        equal,
        "compared collections"
    );
    CollectionDiff {
        expected,
        actual,
        equal,
        order_sensitive,
    }
}

impl CollectionDiff {
    /// Whether both sequences matched
    #[must_use]
    pub const fn equal(&self) -> bool {
        self.equal
    }

    /// Whether order was significant
    #[must_use]
    pub const fn order_sensitive(&self) -> bool {
        self.order_sensitive
    }

    /// Expected items in compared order
    #[must_use]
    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Actual items in compared order
    #[must_use]
    pub fn actual(&self) -> &[String] {
        &self.actual
    }

    /// Expected items without empty entries
    #[must_use]
    pub fn rendered_expected(&self) -> Vec<&str> {
        non_empty(&self.expected)
    }

    /// Actual items without empty entries
    #[must_use]
    pub fn rendered_actual(&self) -> Vec<&str> {
        non_empty(&self.actual)
    }

    /// Expected items absent from the actual side (by multiplicity)
    #[must_use]
    pub fn missing(&self) -> Vec<&str> {
        surplus(&self.expected, &self.actual)
    }

    /// Actual items absent from the expected side (by multiplicity)
    #[must_use]
    pub fn unexpected(&self) -> Vec<&str> {
        surplus(&self.actual, &self.expected)
    }

    /// Expected list as an HTML `<ul>`
    #[must_use]
    pub fn expected_html(&self) -> String {
        render_html_list(&self.rendered_expected())
    }

    /// Actual list as an HTML `<ul>`
    #[must_use]
    pub fn actual_html(&self) -> String {
        render_html_list(&self.rendered_actual())
    }
}

fn non_empty(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect()
}

fn surplus<'a>(left: &'a [String], right: &[String]) -> Vec<&'a str> {
    let mut available: BTreeMap<&str, usize> = BTreeMap::new();
    for item in right {
        *available.entry(item.as_str()).or_default() += 1;
    }
    left.iter()
        .map(String::as_str)
        .filter(|item| match available.get_mut(item) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        })
        .collect()
}

/// Render items as an HTML list, escaping each item
#[must_use]
pub fn render_html_list(items: &[&str]) -> String {
    let mut html = String::from("<ul>");
    for item in items {
        html.push_str("<li>");
        html.push_str(
            &item
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;"),
        );
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod verdict_tests {
        use super::*;

        #[test]
        fn test_unordered_ignores_order() {
            assert!(compare(["B", "A"], ["A", "B"], false).equal());
        }

        #[test]
        fn test_ordered_same_order() {
            assert!(compare(["A", "B"], ["A", "B"], true).equal());
        }

        #[test]
        fn test_ordered_detects_order() {
            assert!(!compare(["B", "A"], ["A", "B"], true).equal());
        }

        #[test]
        fn test_length_mismatch() {
            assert!(!compare(["A", "B", "C"], ["A", "B"], false).equal());
        }

        #[test]
        fn test_empty_sides() {
            let none: [&str; 0] = [];
            assert!(compare(none, none, true).equal());
        }

        #[test]
        fn test_ordinal_sort() {
            let diff = compare(["b", "B", "a", "A"], ["A"], false);
            assert_eq!(diff.expected(), ["A", "B", "a", "b"]);
        }
    }

    mod rendering_tests {
        use super::*;

        #[test]
        fn test_empty_entry_counts_but_is_not_rendered() {
            let diff = compare(["A", ""], ["A"], false);
            assert!(!diff.equal());
            assert_eq!(diff.rendered_expected(), vec!["A"]);
            assert_eq!(diff.rendered_actual(), vec!["A"]);
            assert_eq!(diff.missing(), vec![""]);
        }

        #[test]
        fn test_missing_and_unexpected() {
            let diff = compare(["Peru", "Chile", "Chile"], ["Chile", "Brazil"], false);
            assert_eq!(diff.missing(), vec!["Chile", "Peru"]);
            assert_eq!(diff.unexpected(), vec!["Brazil"]);
        }

        #[test]
        fn test_html_list() {
            let diff = compare(["<b>", "", "x"], ["x"], true);
            assert_eq!(diff.expected_html(), "<ul><li>&lt;b&gt;</li><li>x</li></ul>");
            assert_eq!(render_html_list(&[]), "<ul></ul>");
        }
    }

    proptest! {
        #[test]
        fn prop_unordered_is_permutation_invariant(items in proptest::collection::vec("[a-c]{0,2}", 0..8)) {
            let mut reversed = items.clone();
            reversed.reverse();
            prop_assert!(compare(items, reversed, false).equal());
        }

        #[test]
        fn prop_self_compare_is_equal(items in proptest::collection::vec(".{0,5}", 0..8), ordered in any::<bool>()) {
            prop_assert!(compare(items.clone(), items, ordered).equal());
        }
    }
}
