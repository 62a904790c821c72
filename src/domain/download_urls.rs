//! Derivation of additional download URLs from an artifact locator.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::DeriveAdditionalDownloadUrlsEntry;
use crate::error::ConfigError;

/// Apply every derivation rule to the locator
///
/// Each rule's `$N` capture references are expanded against the first match
/// before the template replaces every match of the pattern. Rules whose
/// pattern does not match are skipped. An invalid pattern fails the artifact.
pub fn derive_additional_download_urls(
    rules: &[DeriveAdditionalDownloadUrlsEntry],
    locator: &str,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut derived = BTreeMap::new();

    for rule in rules {
        let regex = Regex::new(&rule.find_pattern).map_err(|source| ConfigError::InvalidRegex {
            field: "findPattern",
            pattern: rule.find_pattern.clone(),
            source,
        })?;
        let Some(captures) = regex.captures(locator) else {
            continue;
        };

        // Highest group first so `$1` never clobbers the prefix of `$10`
        let mut template = rule.replace_with.clone();
        for group in (1..captures.len()).rev() {
            let value = captures.get(group).map_or("", |m| m.as_str());
            template = template.replace(&format!("${}", group), value);
        }

        let url = regex.replace_all(locator, template.as_str()).into_owned();
        debug!("Derived {} download URL {}", rule.key, url);
        derived.insert(rule.key.clone(), url);
    }

    if derived.is_empty() && !rules.is_empty() {
        warn!(
            "None of the provided deriveAdditionalDownloadURLs entries matched the artifact URL '{}'. No additional download URLs will be added to the artifact.",
            locator
        );
    }
    Ok(derived)
}
