//! C4: Classifier / requires-python synthesizer.
//!
//! Fills in fields listed in `project.dynamic` from `[tool.whey]` data.
//! Grounded on `PyprojectMetadataProvider`'s SPDX-expression validation
//! (`spdx::Expression::parse`, used here for `license_key`) plus spec §4.4's
//! own canonical-order rule, which has no direct corpus precedent and is
//! implemented as plain ordered-group deduplication.

use anyhow::{Context, Result, bail};
use pep440_rs::{Version, VersionSpecifiers};

use crate::classifiers_data::{classifier_for_implementation, classifier_for_platform, classifier_for_spdx};
use crate::error::Diagnostic;
use crate::project_config::DynamicField;
use crate::tool_config::ToolConfig;

/// Synthesizes `requires-python` from the minimum of `python_versions`
/// (spec §4.4).
pub fn synthesize_requires_python(tool: &ToolConfig) -> Result<VersionSpecifiers> {
    if tool.python_versions.is_empty() {
        bail!("`requires-python` is dynamic but nothing to synthesize from");
    }
    let min = tool
        .python_versions
        .iter()
        .map(|raw| {
            raw.parse::<Version>()
                .with_context(|| format!("tool.whey.python_versions entry {raw:?} is not a valid version"))
                .map(|version| (version, raw))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, raw)| raw)
        .expect("non-empty checked above");
    format!(">={min}")
        .parse::<VersionSpecifiers>()
        .with_context(|| format!("tool.whey.python_versions minimum {min:?} is not a valid version"))
}

/// Synthesizes the classifier list from `tool.whey`'s configured versions,
/// license key, and platforms, per spec §4.4's canonical grouping.
///
/// Each group is deduplicated against everything synthesized so far
/// (preserving first occurrence) and sorted internally; the groups
/// themselves are never reordered.
pub fn synthesize_classifiers(tool: &ToolConfig) -> (Vec<String>, Vec<Diagnostic>) {
    let mut seen = std::collections::HashSet::new();
    let mut diagnostics = Vec::new();
    let mut result = Vec::new();

    let mut push_group = |mut group: Vec<String>, seen: &mut std::collections::HashSet<String>, out: &mut Vec<String>| {
        group.sort_unstable();
        for classifier in group {
            if seen.insert(classifier.clone()) {
                out.push(classifier);
            }
        }
    };

    push_group(tool.base_classifiers.clone(), &mut seen, &mut result);

    let mut license_group = Vec::new();
    if let Some(key) = &tool.license_key {
        if key.parse::<spdx::Expression>().is_err() {
            diagnostics.push(Diagnostic::new(format!(
                "tool.whey.license_key {key:?} is not a valid SPDX expression"
            )));
        }
        match classifier_for_spdx(key) {
            Some(classifier) => license_group.push(classifier.to_string()),
            None => diagnostics.push(Diagnostic::new(format!(
                "no classifier known for tool.whey.license_key {key:?}"
            ))),
        }
    }
    push_group(license_group, &mut seen, &mut result);

    let platform_group = tool
        .platforms
        .iter()
        .filter_map(|p| classifier_for_platform(p).map(str::to_string))
        .collect();
    push_group(platform_group, &mut seen, &mut result);

    let mut version_group: Vec<String> = Vec::new();
    if !tool.python_versions.is_empty() {
        version_group.push("Programming Language :: Python :: 3 :: Only".to_string());
    }
    for version in &tool.python_versions {
        version_group.push(format!("Programming Language :: Python :: {version}"));
    }
    push_group(version_group, &mut seen, &mut result);

    let implementation_group = tool
        .python_implementations
        .iter()
        .filter_map(|i| classifier_for_implementation(i).map(str::to_string))
        .collect();
    push_group(implementation_group, &mut seen, &mut result);

    (result, diagnostics)
}

/// The outcome of running the synthesizer over a [`DynamicField`] set:
/// synthesized values plus non-fatal diagnostics to surface to the caller.
pub struct Synthesized {
    pub classifiers: Option<Vec<String>>,
    pub requires_python: Option<VersionSpecifiers>,
    pub dependencies: Option<Vec<pep508_rs::Requirement>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the synthesizer for every field present in `dynamic` (spec §4.4).
pub fn synthesize(
    dynamic: &std::collections::BTreeSet<DynamicField>,
    tool: &ToolConfig,
) -> Result<Synthesized> {
    let mut diagnostics = Vec::new();

    let classifiers = if dynamic.contains(&DynamicField::Classifiers) {
        let (classifiers, mut group_diagnostics) = synthesize_classifiers(tool);
        diagnostics.append(&mut group_diagnostics);
        Some(classifiers)
    } else {
        None
    };

    let requires_python = if dynamic.contains(&DynamicField::RequiresPython) {
        Some(synthesize_requires_python(tool)?)
    } else {
        None
    };

    let dependencies = if dynamic.contains(&DynamicField::Dependencies) {
        Some(Vec::new())
    } else {
        None
    };

    Ok(Synthesized { classifiers, requires_python, dependencies, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_config::Builders;

    fn tool(python_versions: &[&str], platforms: &[&str], license_key: Option<&str>) -> ToolConfig {
        ToolConfig {
            package: "spam".to_string(),
            source_dir: ".".to_string(),
            additional_files: Vec::new(),
            license_key: license_key.map(str::to_string),
            base_classifiers: Vec::new(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            python_implementations: Vec::new(),
            python_versions: python_versions.iter().map(|s| s.to_string()).collect(),
            builders: Builders::default(),
        }
    }

    #[test]
    fn synthesizes_canonical_classifier_order() {
        let config = tool(&["3.9", "3.8"], &["Linux"], Some("MIT"));
        let (classifiers, diagnostics) = synthesize_classifiers(&config);
        assert!(diagnostics.is_empty());
        assert_eq!(
            classifiers,
            vec![
                "License :: OSI Approved :: MIT License",
                "Operating System :: POSIX :: Linux",
                "Programming Language :: Python :: 3 :: Only",
                "Programming Language :: Python :: 3.8",
                "Programming Language :: Python :: 3.9",
            ]
        );
    }

    #[test]
    fn requires_python_from_minimum_version() {
        let config = tool(&["3.9", "3.8", "3.10"], &[], None);
        let specifiers = synthesize_requires_python(&config).unwrap();
        assert_eq!(specifiers.to_string(), ">=3.8");
    }

    #[test]
    fn requires_python_fails_with_no_versions() {
        let config = tool(&[], &[], None);
        assert!(synthesize_requires_python(&config).is_err());
    }

    #[test]
    fn unknown_license_key_warns_without_failing() {
        let config = tool(&[], &[], Some("Unlicense"));
        let (classifiers, diagnostics) = synthesize_classifiers(&config);
        assert!(classifiers.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }
}
