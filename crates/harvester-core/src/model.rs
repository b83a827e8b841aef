use std::fmt;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(Uuid);

impl BusinessId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BusinessId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Restaurant,
    Hotel,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Restaurant => "Restaurant",
            Self::Hotel => "Hotel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which categories a search or lookup is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    Restaurants,
    Hotels,
    #[default]
    Both,
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::Restaurants => category == Category::Restaurant,
            Self::Hotels => category == Category::Hotel,
            Self::Both => true,
        }
    }

    /// Categories covered by the filter, restaurants first
    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::Restaurants => &[Category::Restaurant],
            Self::Hotels => &[Category::Hotel],
            Self::Both => &[Category::Restaurant, Category::Hotel],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub id: BusinessId,
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl BusinessRecord {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: BusinessId::new(),
            name: name.into(),
            category,
            owner: None,
            email: None,
            phone: None,
            address: None,
            url: None,
            postal_code: None,
        }
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn has_email(&self) -> bool {
        is_present(&self.email)
    }

    pub fn has_phone(&self) -> bool {
        is_present(&self.phone)
    }

    /// Returns a copy with the crawled fields laid over the current ones.
    ///
    /// Fields the crawl did not return keep their current value.
    pub fn merged(&self, crawled: &PartialRecord) -> Self {
        let pick = |new: &Option<String>, old: &Option<String>| {
            non_blank(new).or_else(|| old.clone())
        };
        Self {
            email: pick(&crawled.email, &self.email),
            phone: pick(&crawled.phone, &self.phone),
            owner: pick(&crawled.owner, &self.owner),
            ..self.clone()
        }
    }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field.clone().filter(|v| !v.trim().is_empty())
}

/// Contact fields a crawl may return for a business website
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl PartialRecord {
    pub fn is_empty(&self) -> bool {
        !is_present(&self.email) && !is_present(&self.phone) && !is_present(&self.owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    location: String,
    category: CategoryFilter,
}

impl SearchQuery {
    pub fn new(location: impl AsRef<str>, category: CategoryFilter) -> anyhow::Result<Self> {
        let location = location.as_ref().trim();
        if location.is_empty() {
            bail!("Please enter a city or postal code");
        }
        Ok(Self {
            location: location.to_string(),
            category,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalCodeGroup {
    pub postal_code: String,
    pub businesses: Vec<BusinessRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub businesses: Vec<BusinessRecord>,
    pub total_count: usize,
    /// Groups in postal code resolution order
    pub postal_code_breakdown: Vec<PostalCodeGroup>,
}

impl SearchResults {
    /// Builds the flat list from the groups so both views always agree.
    pub fn from_groups(groups: Vec<PostalCodeGroup>) -> Self {
        let businesses: Vec<_> = groups
            .iter()
            .flat_map(|g| g.businesses.iter().cloned())
            .collect();
        Self {
            total_count: businesses.len(),
            businesses,
            postal_code_breakdown: groups,
        }
    }

    pub fn postal_codes(&self) -> impl Iterator<Item = &str> {
        self.postal_code_breakdown
            .iter()
            .map(|g| g.postal_code.as_str())
    }

    pub fn group(&self, postal_code: &str) -> Option<&[BusinessRecord]> {
        self.postal_code_breakdown
            .iter()
            .find(|g| g.postal_code == postal_code)
            .map(|g| g.businesses.as_slice())
    }
}
