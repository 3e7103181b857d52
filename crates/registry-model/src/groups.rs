//! Tumor groups: named sets of anatomical site codes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::codes::SiteCode;

/// Group name for site codes that belong to no configured group.
pub const OTHER_GROUP: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TumorGroup {
    pub name: String,
    pub site_codes: BTreeSet<SiteCode>,
}

impl TumorGroup {
    pub fn new(name: impl Into<String>, site_codes: impl IntoIterator<Item = SiteCode>) -> Self {
        Self {
            name: name.into(),
            site_codes: site_codes.into_iter().collect(),
        }
    }

    pub fn contains(&self, site: &SiteCode) -> bool {
        self.site_codes.contains(site)
    }
}

/// Ordered tumor groups; the first group containing a site code wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TumorGroups {
    groups: Vec<TumorGroup>,
}

impl TumorGroups {
    pub fn new(groups: Vec<TumorGroup>) -> Self {
        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TumorGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group name for a site code, [`OTHER_GROUP`] when unmatched or missing.
    pub fn resolve(&self, site: Option<&SiteCode>) -> &str {
        site.and_then(|site| self.groups.iter().find(|group| group.contains(site)))
            .map_or(OTHER_GROUP, |group| group.name.as_str())
    }

    /// Every site code declared by any group.
    pub fn all_site_codes(&self) -> BTreeSet<SiteCode> {
        self.groups
            .iter()
            .flat_map(|group| group.site_codes.iter().cloned())
            .collect()
    }
}
