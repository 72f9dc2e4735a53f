//! Payment frequency reference data.
//!
//! A [`Frequency`] is immutable once built; the [`FrequencyCatalog`] is the
//! id-keyed lookup that callers resolve a loan's frequency reference through
//! before invoking the calculator or the schedule generator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::LoanResult;

/// Payment cadence: how many payments per year and how far apart they fall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub id: u32,
    pub frequency_type: String,
    pub payments_per_year: u32,
    pub days_between_payments: u32,
}

impl Frequency {
    pub fn new(
        id: u32,
        frequency_type: impl Into<String>,
        payments_per_year: u32,
        days_between_payments: u32,
    ) -> LoanResult<Self> {
        let frequency = Frequency {
            id,
            frequency_type: frequency_type.into(),
            payments_per_year,
            days_between_payments,
        };
        frequency.validate()?;
        Ok(frequency)
    }

    /// Both counts must be strictly positive.
    pub fn validate(&self) -> LoanResult<()> {
        if self.payments_per_year == 0 {
            return Err(LoanError::InvalidInput {
                field: "payments_per_year".into(),
                reason: format!(
                    "Frequency '{}' must have at least one payment per year",
                    self.frequency_type
                ),
            });
        }
        if self.days_between_payments == 0 {
            return Err(LoanError::InvalidInput {
                field: "days_between_payments".into(),
                reason: format!(
                    "Frequency '{}' must have a positive payment interval",
                    self.frequency_type
                ),
            });
        }
        Ok(())
    }
}

/// Ordered, validated set of frequencies keyed by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrequencyCatalog {
    entries: BTreeMap<u32, Frequency>,
}

impl FrequencyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven standard cadences, ids 1 through 7.
    pub fn standard() -> Self {
        let seed = [
            (1, "Weekly", 52, 7),
            (2, "Bi-Weekly", 26, 14),
            (3, "Semi-Monthly", 24, 15),
            (4, "Monthly", 12, 30),
            (5, "Quarterly", 4, 91),
            (6, "Semi-Annually", 2, 182),
            (7, "Annually", 1, 365),
        ];
        let entries = seed
            .into_iter()
            .map(|(id, name, ppy, days)| {
                (
                    id,
                    Frequency {
                        id,
                        frequency_type: name.to_string(),
                        payments_per_year: ppy,
                        days_between_payments: days,
                    },
                )
            })
            .collect();
        FrequencyCatalog { entries }
    }

    /// Build a catalog from externally supplied rows, validating each one and
    /// rejecting repeated ids or frequency types.
    pub fn from_frequencies(frequencies: Vec<Frequency>) -> LoanResult<Self> {
        let mut catalog = FrequencyCatalog::new();
        for frequency in frequencies {
            frequency.validate()?;
            if catalog.entries.contains_key(&frequency.id) {
                return Err(LoanError::InvalidInput {
                    field: "id".into(),
                    reason: format!("Frequency id {} appears more than once", frequency.id),
                });
            }
            if catalog.find_by_type(&frequency.frequency_type).is_some() {
                return Err(LoanError::DuplicateFrequency(frequency.frequency_type));
            }
            catalog.entries.insert(frequency.id, frequency);
        }
        Ok(catalog)
    }

    pub fn get(&self, id: u32) -> LoanResult<&Frequency> {
        self.entries.get(&id).ok_or(LoanError::FrequencyNotFound(id))
    }

    pub fn find_by_type(&self, frequency_type: &str) -> Option<&Frequency> {
        self.entries
            .values()
            .find(|f| f.frequency_type == frequency_type)
    }

    /// Add a frequency under the next free id.
    pub fn insert(
        &mut self,
        frequency_type: &str,
        payments_per_year: u32,
        days_between_payments: u32,
    ) -> LoanResult<&Frequency> {
        if self.find_by_type(frequency_type).is_some() {
            return Err(LoanError::DuplicateFrequency(frequency_type.to_string()));
        }
        let id = match self.entries.keys().next_back() {
            None => 1,
            Some(last) => last.checked_add(1).ok_or_else(|| LoanError::InvalidInput {
                field: "id".into(),
                reason: format!("no id left after {last} for frequency '{frequency_type}'"),
            })?,
        };
        let frequency =
            Frequency::new(id, frequency_type, payments_per_year, days_between_payments)?;
        Ok(&*self.entries.entry(id).or_insert(frequency))
    }

    pub fn update(
        &mut self,
        id: u32,
        frequency_type: &str,
        payments_per_year: u32,
        days_between_payments: u32,
    ) -> LoanResult<&Frequency> {
        if !self.entries.contains_key(&id) {
            return Err(LoanError::FrequencyNotFound(id));
        }
        if self
            .entries
            .values()
            .any(|f| f.frequency_type == frequency_type && f.id != id)
        {
            return Err(LoanError::DuplicateFrequency(frequency_type.to_string()));
        }
        let replacement =
            Frequency::new(id, frequency_type, payments_per_year, days_between_payments)?;
        self.entries.insert(id, replacement);
        self.get(id)
    }

    pub fn remove(&mut self, id: u32) -> LoanResult<Frequency> {
        self.entries.remove(&id).ok_or(LoanError::FrequencyNotFound(id))
    }

    pub fn first(&self) -> Option<&Frequency> {
        self.entries.values().next()
    }

    pub fn last(&self) -> Option<&Frequency> {
        self.entries.values().next_back()
    }

    /// Closest entry with a smaller id.
    pub fn previous(&self, id: u32) -> Option<&Frequency> {
        self.entries.range(..id).next_back().map(|(_, f)| f)
    }

    /// Closest entry with a larger id.
    pub fn next(&self, id: u32) -> Option<&Frequency> {
        self.entries
            .range(id.saturating_add(1)..)
            .next()
            .filter(|(k, _)| **k > id)
            .map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frequency> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = FrequencyCatalog::standard();
        assert_eq!(catalog.len(), 7);
        let monthly = catalog.get(4).unwrap();
        assert_eq!(monthly.frequency_type, "Monthly");
        assert_eq!(monthly.payments_per_year, 12);
        assert_eq!(monthly.days_between_payments, 30);
        assert_eq!(catalog.first().unwrap().frequency_type, "Weekly");
        assert_eq!(catalog.last().unwrap().frequency_type, "Annually");
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let catalog = FrequencyCatalog::standard();
        assert!(matches!(catalog.get(99), Err(LoanError::FrequencyNotFound(99))));
    }

    #[test]
    fn test_zero_payments_per_year_rejected() {
        assert!(Frequency::new(1, "Never", 0, 30).is_err());
        assert!(Frequency::new(1, "Instant", 12, 0).is_err());
    }

    #[test]
    fn test_insert_assigns_next_id_and_rejects_duplicates() {
        let mut catalog = FrequencyCatalog::standard();
        let id = catalog.insert("Every Four Weeks", 13, 28).unwrap().id;
        assert_eq!(id, 8);
        assert!(matches!(
            catalog.insert("Monthly", 12, 30),
            Err(LoanError::DuplicateFrequency(_))
        ));
    }

    #[test]
    fn test_insert_after_highest_possible_id() {
        let top = Frequency::new(u32::MAX, "Daily", 365, 1).unwrap();
        let mut catalog = FrequencyCatalog::from_frequencies(vec![top]).unwrap();
        assert!(matches!(
            catalog.insert("Weekly", 52, 7),
            Err(LoanError::InvalidInput { .. })
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_and_remove() {
        let mut catalog = FrequencyCatalog::standard();
        catalog.update(3, "Twice Monthly", 24, 15).unwrap();
        assert_eq!(catalog.get(3).unwrap().frequency_type, "Twice Monthly");
        // Renaming onto another entry's type is refused
        assert!(catalog.update(3, "Weekly", 52, 7).is_err());

        let removed = catalog.remove(3).unwrap();
        assert_eq!(removed.id, 3);
        assert!(catalog.remove(3).is_err());
    }

    #[test]
    fn test_previous_and_next_skip_gaps() {
        let mut catalog = FrequencyCatalog::standard();
        catalog.remove(4).unwrap();
        assert_eq!(catalog.next(3).unwrap().id, 5);
        assert_eq!(catalog.previous(5).unwrap().id, 3);
        assert!(catalog.previous(1).is_none());
        assert!(catalog.next(7).is_none());
    }

    #[test]
    fn test_from_frequencies_validates() {
        let rows = vec![
            Frequency::new(1, "Monthly", 12, 30).unwrap(),
            Frequency::new(2, "Monthly", 12, 31).unwrap(),
        ];
        assert!(matches!(
            FrequencyCatalog::from_frequencies(rows),
            Err(LoanError::DuplicateFrequency(_))
        ));

        let bad = vec![Frequency {
            id: 1,
            frequency_type: "Broken".into(),
            payments_per_year: 0,
            days_between_payments: 30,
        }];
        assert!(FrequencyCatalog::from_frequencies(bad).is_err());
    }
}
