use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{BusinessId, BusinessRecord};
use crate::pipeline::percent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFilter {
    pub has_email: bool,
    pub has_phone: bool,
}

impl ResultFilter {
    pub fn accepts(&self, record: &BusinessRecord) -> bool {
        (!self.has_email || record.has_email()) && (!self.has_phone || record.has_phone())
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a BusinessRecord>
    where
        I: IntoIterator<Item = &'a BusinessRecord>,
    {
        records.into_iter().filter(|r| self.accepts(r)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Category,
    Owner,
    Email,
    Phone,
    Address,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortField {
    fn key<'a>(&self, record: &'a BusinessRecord) -> &'a str {
        let field = match self {
            Self::Name => return &record.name,
            Self::Category => return record.category.label(),
            Self::Owner => &record.owner,
            Self::Email => &record.email,
            Self::Phone => &record.phone,
            Self::Address => &record.address,
        };
        field.as_deref().unwrap_or("")
    }

    fn compare(&self, a: &BusinessRecord, b: &BusinessRecord) -> Ordering {
        let (a, b) = (self.key(a), self.key(b));
        a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
    }
}

/// Stable sort, missing values sort as empty text
pub fn sort_records(records: &mut [BusinessRecord], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| match direction {
        SortDirection::Asc => field.compare(a, b),
        SortDirection::Desc => field.compare(b, a),
    });
}

/// Businesses collected for export, first occurrence of an id wins
#[derive(Debug, Clone, Default)]
pub struct ExtractedSet {
    ids: HashSet<BusinessId>,
    records: Vec<BusinessRecord>,
}

impl ExtractedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the id was already collected.
    pub fn insert(&mut self, record: BusinessRecord) -> bool {
        if !self.ids.insert(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, id: BusinessId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BusinessRecord> {
        self.records
    }

    /// Share of `total` collected so far, as a rounded percentage
    pub fn progress(&self, total: usize) -> u8 {
        percent(self.records.len(), total)
    }
}

impl Extend<BusinessRecord> for ExtractedSet {
    fn extend<T: IntoIterator<Item = BusinessRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}
