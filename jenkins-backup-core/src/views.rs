/*!
View attribute extraction and membership differencing.

A list view's membership comes from two sources on the server: jobs matched by
the view's `includeRegex`, and jobs someone added by hand. On restore the
regex-driven part cannot be replayed literally (the target evaluates the
pattern against its own job set), so capture records only the members the
regex does not account for.
*/

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{BackupError, Result};

static FILTER_QUEUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<filterQueue>(.*)</filterQueue>").unwrap());
static FILTER_EXECUTORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<filterExecutors>(.*)</filterExecutors>").unwrap());
static INCLUDE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<includeRegex>(.*)</includeRegex>").unwrap());

/// Attributes of a list view needed to recreate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewAttributes {
    pub filter_queue: Option<String>,
    pub filter_executors: Option<String>,
    pub regex: Option<String>,
}

impl ViewAttributes {
    /// Pull the well-known tags out of a view's `config.xml`.
    ///
    /// A missing tag stays `None` so the target server applies its own
    /// default on restore, rather than a synthesized false/empty value.
    pub fn from_config_xml(xml: &str) -> Self {
        Self {
            filter_queue: capture(&FILTER_QUEUE, xml),
            filter_executors: capture(&FILTER_EXECUTORS, xml),
            regex: capture(&INCLUDE_REGEX, xml),
        }
    }
}

fn capture(pattern: &Regex, xml: &str) -> Option<String> {
    pattern
        .captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Members of a view that its include regex does not account for.
///
/// Each member is kept, in listing order, unless a regex is present and
/// search-matches it (the way Jenkins matches job names against
/// `includeRegex`; not a full match). Deterministic: same inputs, same
/// output.
pub fn explicit_jobs(members: &[String], regex: Option<&str>) -> Result<Vec<String>> {
    let matcher = match regex {
        Some(pattern) => Some(Regex::new(pattern).map_err(|e| BackupError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    Ok(members
        .iter()
        .filter(|job| match &matcher {
            Some(re) => !re.is_match(job.as_str()),
            None => true,
        })
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_regex_keeps_all_members_in_order() {
        let members = names(&["deploy", "build", "audit"]);
        let explicit = explicit_jobs(&members, None).unwrap();
        assert_eq!(explicit, members);
    }

    #[test]
    fn test_regex_matched_members_are_dropped() {
        // "deploy" matches ^dep, "build" does not.
        let members = names(&["deploy", "build"]);
        let explicit = explicit_jobs(&members, Some("^dep")).unwrap();
        assert_eq!(explicit, names(&["build"]));
    }

    #[test]
    fn test_regex_uses_search_semantics() {
        // A substring hit anywhere in the name counts as matched.
        let members = names(&["nightly-build", "deploy"]);
        let explicit = explicit_jobs(&members, Some("build")).unwrap();
        assert_eq!(explicit, names(&["deploy"]));
    }

    #[test]
    fn test_order_is_preserved_for_unmatched_members() {
        let members = names(&["zeta", "dep-1", "alpha", "dep-2", "mid"]);
        let explicit = explicit_jobs(&members, Some("^dep")).unwrap();
        assert_eq!(explicit, names(&["zeta", "alpha", "mid"]));
    }

    #[test]
    fn test_empty_member_set() {
        assert!(explicit_jobs(&[], Some("^dep")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let result = explicit_jobs(&names(&["build"]), Some("("));
        assert!(matches!(result, Err(BackupError::InvalidRegex { .. })));
    }

    #[test]
    fn test_attribute_extraction() {
        let xml = "<hudson.model.ListView>\
                   <name>releases</name>\
                   <filterQueue>true</filterQueue>\
                   <includeRegex>^dep</includeRegex>\
                   </hudson.model.ListView>";
        let attrs = ViewAttributes::from_config_xml(xml);
        assert_eq!(attrs.filter_queue.as_deref(), Some("true"));
        assert_eq!(attrs.filter_executors, None);
        assert_eq!(attrs.regex.as_deref(), Some("^dep"));
    }

    #[test]
    fn test_attribute_extraction_all_absent() {
        let attrs = ViewAttributes::from_config_xml("<hudson.model.ListView/>");
        assert_eq!(attrs, ViewAttributes::default());
    }
}
