//! Client-side record search

use crate::model::Record;

/// Filters `records` to those where any of `fields` contains `term`.
///
/// Matching is a case-insensitive substring test against each value's plain
/// string form. An empty term keeps every record. Order is preserved.
///
/// # Example
///
/// ```
/// use cms_lib::model::Record;
/// use cms_lib::table::search;
///
/// let records = vec![
///     Record::new().set("name", "Rock"),
///     Record::new().set("name", "Jazz"),
/// ];
/// let fields = vec!["name".to_string()];
///
/// assert_eq!(search(&records, &fields, "ROC").len(), 1);
/// assert_eq!(search(&records, &fields, "").len(), 2);
/// ```
pub fn search<'a>(records: &'a [Record], fields: &[String], term: &str) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.iter().collect();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| {
            fields.iter().any(|field| {
                record
                    .get(field)
                    .map(|value| value.to_search_string().to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}
