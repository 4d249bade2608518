//! Embedded trove-classifier snapshot and SPDX-to-classifier mapping.
//!
//! A curated subset, not the full PyPI classifier list (that list changes
//! independently of this crate's releases and has thousands of entries);
//! covers the classifiers exercised by this crate's own test fixtures and
//! the common ones a real project is likely to declare. Grounded on the
//! `PyprojectMetadataProvider` license-handling code's use of the `spdx`
//! crate for expression validation; the classifier-equivalence table below
//! has no corpus precedent and is a supplemented addition (see DESIGN.md).

/// Known trove classifiers, sorted for bisection-friendly `binary_search`.
const CLASSIFIERS: &[&str] = &[
    "Development Status :: 1 - Planning",
    "Development Status :: 2 - Pre-Alpha",
    "Development Status :: 3 - Alpha",
    "Development Status :: 4 - Beta",
    "Development Status :: 5 - Production/Stable",
    "Development Status :: 6 - Mature",
    "Development Status :: 7 - Inactive",
    "Intended Audience :: Developers",
    "Intended Audience :: End Users/Desktop",
    "Intended Audience :: Science/Research",
    "Intended Audience :: System Administrators",
    "License :: OSI Approved :: Apache Software License",
    "License :: OSI Approved :: BSD License",
    "License :: OSI Approved :: GNU General Public License v2 (GPLv2)",
    "License :: OSI Approved :: GNU General Public License v3 (GPLv3)",
    "License :: OSI Approved :: GNU Lesser General Public License v3 (LGPLv3)",
    "License :: OSI Approved :: MIT License",
    "License :: OSI Approved :: Mozilla Public License 2.0 (MPL 2.0)",
    "Operating System :: MacOS",
    "Operating System :: MacOS :: MacOS X",
    "Operating System :: Microsoft :: Windows",
    "Operating System :: OS Independent",
    "Operating System :: POSIX",
    "Operating System :: POSIX :: Linux",
    "Programming Language :: Python",
    "Programming Language :: Python :: 3",
    "Programming Language :: Python :: 3 :: Only",
    "Programming Language :: Python :: 3.10",
    "Programming Language :: Python :: 3.11",
    "Programming Language :: Python :: 3.12",
    "Programming Language :: Python :: 3.13",
    "Programming Language :: Python :: 3.8",
    "Programming Language :: Python :: 3.9",
    "Programming Language :: Python :: Implementation :: CPython",
    "Programming Language :: Python :: Implementation :: PyPy",
    "Topic :: Software Development :: Build Tools",
    "Topic :: Software Development :: Libraries",
    "Topic :: Software Development :: Libraries :: Python Modules",
    "Typing :: Typed",
];

/// Returns whether `classifier` is one of [`CLASSIFIERS`].
pub fn is_known_classifier(classifier: &str) -> bool {
    CLASSIFIERS.binary_search(&classifier).is_ok()
}

/// Maps a handful of common single-identifier SPDX expressions to their
/// corresponding "License :: OSI Approved :: ..." classifier, for
/// `tool.whey.license-key`-driven classifier synthesis (spec §4.4). An
/// expression with no entry here synthesizes no license classifier; this is
/// not a correctness defect (a project may always list the classifier
/// itself), just a scope limit on the lookup table.
pub fn classifier_for_spdx(expression: &str) -> Option<&'static str> {
    match expression {
        "MIT" => Some("License :: OSI Approved :: MIT License"),
        "Apache-2.0" => Some("License :: OSI Approved :: Apache Software License"),
        "BSD-2-Clause" | "BSD-3-Clause" => Some("License :: OSI Approved :: BSD License"),
        "GPL-2.0-only" | "GPL-2.0-or-later" => {
            Some("License :: OSI Approved :: GNU General Public License v2 (GPLv2)")
        }
        "GPL-3.0-only" | "GPL-3.0-or-later" => {
            Some("License :: OSI Approved :: GNU General Public License v3 (GPLv3)")
        }
        "LGPL-3.0-only" | "LGPL-3.0-or-later" => {
            Some("License :: OSI Approved :: GNU Lesser General Public License v3 (LGPLv3)")
        }
        "MPL-2.0" => Some("License :: OSI Approved :: Mozilla Public License 2.0 (MPL 2.0)"),
        _ => None,
    }
}

/// Maps a `tool.whey.platforms` entry to its "Operating System :: ..."
/// classifier (spec §4.4 step (b)).
pub fn classifier_for_platform(platform: &str) -> Option<&'static str> {
    match platform {
        "Linux" => Some("Operating System :: POSIX :: Linux"),
        "POSIX" => Some("Operating System :: POSIX"),
        "Windows" => Some("Operating System :: Microsoft :: Windows"),
        "macOS" | "MacOS" => Some("Operating System :: MacOS :: MacOS X"),
        _ => None,
    }
}

/// Maps a `tool.whey.python_implementations` entry to its
/// "Programming Language :: Python :: Implementation :: ..." classifier
/// (spec §4.4 step (d)).
pub fn classifier_for_implementation(implementation: &str) -> Option<&'static str> {
    match implementation {
        "CPython" => Some("Programming Language :: Python :: Implementation :: CPython"),
        "PyPy" => Some("Programming Language :: Python :: Implementation :: PyPy"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted() {
        let mut sorted = CLASSIFIERS.to_vec();
        sorted.sort_unstable();
        assert_eq!(CLASSIFIERS, sorted.as_slice());
    }

    #[test]
    fn recognizes_known_classifier() {
        assert!(is_known_classifier("Programming Language :: Python :: 3"));
        assert!(!is_known_classifier("Not :: A :: Real :: Classifier"));
    }

    #[test]
    fn maps_common_spdx_identifiers() {
        assert_eq!(
            classifier_for_spdx("MIT"),
            Some("License :: OSI Approved :: MIT License")
        );
        assert_eq!(classifier_for_spdx("Unlicense"), None);
    }
}
