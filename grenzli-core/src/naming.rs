//! Maps countries to file stems that are safe to use inside a directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Country;

const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// How output and staging files are named.
pub enum FileNaming {
    /// Sanitized country name, e.g. `Germany.geojson`.
    #[default]
    Name,
    /// Upper-case ISO alpha-2 code, e.g. `DE.geojson`.
    IsoCode,
}

impl FileNaming {
    /// File stem (no extension) for the country.
    #[must_use]
    pub fn file_stem(self, country: &Country) -> String {
        let iso = country.iso_code.trim().to_ascii_uppercase();
        match self {
            FileNaming::IsoCode => iso,
            FileNaming::Name => {
                let stem = sanitize(&country.name);
                if stem.is_empty() { iso } else { stem }
            }
        }
    }
}

impl fmt::Display for FileNaming {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            FileNaming::Name => "name",
            FileNaming::IsoCode => "iso-code",
        };
        write!(formatter, "{slug}")
    }
}

impl FromStr for FileNaming {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(FileNaming::Name),
            "iso-code" | "iso" => Ok(FileNaming::IsoCode),
            other => Err(format!("unknown file naming: {other}")),
        }
    }
}

/// Replace path-unsafe characters with `_`, trim, and strip leading dots.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|ch| {
            if ch.is_control() || UNSAFE_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .collect();
    replaced.trim().trim_start_matches('.').trim_start().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_kept() {
        let wakanda = Country::new("Wakanda", "WK");
        assert_eq!(FileNaming::Name.file_stem(&wakanda), "Wakanda");

        let bes = Country::new("Bonaire, Sint Eustatius and Saba", "BQ");
        assert_eq!(
            FileNaming::Name.file_stem(&bes),
            "Bonaire, Sint Eustatius and Saba"
        );
    }

    #[test]
    fn separators_and_reserved_chars_are_replaced() {
        assert_eq!(sanitize("A/B"), "A_B");
        assert_eq!(sanitize(r"C:\evil"), "C__evil");
        assert_eq!(sanitize("what?*\"<>|"), "what______");
        assert_eq!(sanitize("tab\there"), "tab_here");
    }

    #[test]
    fn traversal_is_neutralised() {
        assert_eq!(sanitize("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize(" .hidden "), "hidden");
    }

    #[test]
    fn empty_name_falls_back_to_iso() {
        let blank = Country::new(" ... ", "xx");
        assert_eq!(FileNaming::Name.file_stem(&blank), "XX");
    }

    #[test]
    fn iso_naming_uses_upper_case_code() {
        let country = Country::new("Côte d'Ivoire", "ci");
        assert_eq!(FileNaming::IsoCode.file_stem(&country), "CI");
    }
}
