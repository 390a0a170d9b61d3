//! Selects the records that fall within a period or match a search term.

use time::UtcOffset;

use crate::{period::PeriodRule, record::Record};

/// Whether `record` was created within `rule` in the timezone `local_offset`.
pub fn matches(rule: &PeriodRule, record: &Record, local_offset: UtcOffset) -> bool {
    rule.matches(record.local_date(local_offset))
}

/// Get the records that fall within `rule`, in their original order.
///
/// Records whose creation date could not be parsed are only kept when `rule`
/// is [PeriodRule::Unrestricted].
pub fn filter_records<'a>(
    records: &'a [Record],
    rule: &PeriodRule,
    local_offset: UtcOffset,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| matches(rule, record, local_offset))
        .collect()
}

/// Whether the name, external ID or phone number of `record` contains `term`,
/// ignoring case.
///
/// An empty or blank term matches every record.
pub fn matches_search(record: &Record, term: &str) -> bool {
    let term = term.trim().to_lowercase();

    if term.is_empty() {
        return true;
    }

    [&record.name, &record.external_id, &record.phone]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Keep the records that match the search `term`, in their original order.
pub fn search_records<'a>(records: &[&'a Record], term: &str) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|record| matches_search(record, term))
        .collect()
}
