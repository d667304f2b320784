//! Namespace selector evaluation.
//!
//! Pure decision function: given a namespace's labels and the configured
//! selector, decide whether the namespace opts into broker injection.
//!
//! A deprecated boolean label takes precedence over the configured selector:
//! `eventing.knative.dev/injection=enabled` forces a match and
//! `eventing.knative.dev/injection=disabled` forces a non-match, whatever
//! the selector says. Any other value of that label falls through to normal
//! selector evaluation.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::collections::BTreeMap;

/// Deprecated per-namespace opt-in label, kept for compatibility.
pub const LEGACY_INJECTION_LABEL_KEY: &str = "eventing.knative.dev/injection";

/// Legacy label value forcing a match.
pub const LEGACY_INJECTION_ENABLED: &str = "enabled";

/// Legacy label value forcing a non-match.
pub const LEGACY_INJECTION_DISABLED: &str = "disabled";

/// Decide whether a namespace with the given labels opts in.
///
/// The legacy label is checked first and short-circuits. Otherwise the
/// configured selector is evaluated with standard label-selector semantics.
/// No selector configured means no namespace opts in (closed-by-default);
/// an explicitly configured selector with no terms matches every namespace.
pub fn matches(labels: &BTreeMap<String, String>, selector: Option<&LabelSelector>) -> bool {
    match labels.get(LEGACY_INJECTION_LABEL_KEY).map(String::as_str) {
        Some(LEGACY_INJECTION_ENABLED) => return true,
        Some(LEGACY_INJECTION_DISABLED) => return false,
        _ => {}
    }

    selector.is_some_and(|s| selector_matches(labels, s))
}

/// Evaluate a `LabelSelector` against a label set.
///
/// All `matchLabels` pairs and all `matchExpressions` must be satisfied.
fn selector_matches(labels: &BTreeMap<String, String>, selector: &LabelSelector) -> bool {
    if let Some(match_labels) = &selector.match_labels {
        for (key, value) in match_labels {
            if labels.get(key) != Some(value) {
                return false;
            }
        }
    }

    if let Some(expressions) = &selector.match_expressions {
        for requirement in expressions {
            if !requirement_matches(labels, requirement) {
                return false;
            }
        }
    }

    true
}

fn requirement_matches(
    labels: &BTreeMap<String, String>,
    requirement: &LabelSelectorRequirement,
) -> bool {
    let value = labels.get(&requirement.key);
    let in_values = |v: &String| {
        requirement
            .values
            .as_ref()
            .is_some_and(|values| values.contains(v))
    };

    match requirement.operator.as_str() {
        "In" => value.is_some_and(in_values),
        // NotIn is satisfied by an absent key, matching apimachinery
        "NotIn" => value.is_none_or(|v| !in_values(v)),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        // The evaluator is error-free: an invalid operator never matches
        _ => false,
    }
}
