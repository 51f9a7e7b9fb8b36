//! Dashboard sections: the fixed, closed set of analytics categories.
//!
//! Every section owns an ordered list of expected `insight_type` tags. The prompt
//! builder asks for exactly these, the fallback table provides exactly these, and the
//! presentation layer routes cards by them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five analytics categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Sales,
    Funding,
    Benchmarks,
    Projects,
    Satisfaction,
}

/// Error for a section name outside the fixed set (strict parsing only).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section: {0}")]
pub struct UnknownSection(pub String);

impl Section {
    /// All sections in fixed report order.
    pub const ALL: [Section; 5] = [
        Section::Sales,
        Section::Funding,
        Section::Benchmarks,
        Section::Projects,
        Section::Satisfaction,
    ];

    /// Wire name used in requests, store records, and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Sales => "sales",
            Section::Funding => "funding",
            Section::Benchmarks => "benchmarks",
            Section::Projects => "projects",
            Section::Satisfaction => "satisfaction",
        }
    }

    /// Page / card heading.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Sales => "Sales Performance",
            Section::Funding => "Funding Health",
            Section::Benchmarks => "Performance Benchmarks",
            Section::Projects => "Project Health",
            Section::Satisfaction => "Customer Satisfaction",
        }
    }

    /// Ordered `insight_type` tags this section produces.
    pub fn insight_types(&self) -> &'static [&'static str] {
        match self {
            Section::Sales => &["performance", "recommendation", "opportunity"],
            Section::Funding => &["warning", "success"],
            Section::Benchmarks => &["excellence", "loyalty", "growth"],
            Section::Projects => &["bottleneck", "lag", "strength"],
            Section::Satisfaction => &["installation", "trend", "post-funding"],
        }
    }

    /// Number of insights a generation for this section requests.
    pub fn insight_count(&self) -> usize {
        self.insight_types().len()
    }

    /// Lenient lookup: unknown names alias to [`Section::Sales`].
    ///
    /// Used on the generation path, where an unrecognized section still gets the sales
    /// template and the sales fallback list.
    pub fn resolve(name: &str) -> Section {
        match name.parse() {
            Ok(section) => section,
            Err(UnknownSection(name)) => {
                tracing::warn!(section = %name, "unknown section; using sales template");
                Section::Sales
            }
        }
    }
}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s.trim())
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!("funding".parse::<Section>(), Ok(Section::Funding));
        assert!("bogus_section".parse::<Section>().is_err());
    }

    #[test]
    fn resolve_aliases_unknown_to_sales() {
        assert_eq!(Section::resolve("bogus_section"), Section::Sales);
        assert_eq!(Section::resolve(""), Section::Sales);
        assert_eq!(Section::resolve("projects"), Section::Projects);
    }

    #[test]
    fn insight_types_unique_per_section() {
        for section in Section::ALL {
            let types = section.insight_types();
            let mut deduped = types.to_vec();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(deduped.len(), types.len(), "{section}");
        }
    }
}
