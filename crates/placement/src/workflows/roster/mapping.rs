use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::sync::OnceLock;

static HEADER_MAP: OnceLock<HashMap<String, &'static str>> = OnceLock::new();

/// Canonical field name for a roster header, if the header is recognized.
pub(crate) fn field_for_normalized(normalized_header: &str) -> Option<&'static str> {
    header_map().get(normalized_header).copied()
}

fn header_map() -> &'static HashMap<String, &'static str> {
    HEADER_MAP.get_or_init(|| {
        const HEADER_TO_FIELD: &[(&str, &str)] = &[
            // Identity
            ("id", "id"),
            ("ت", "id"),
            ("applicant id", "id"),
            ("student id", "id"),
            // Ranking
            ("score", "score"),
            ("average", "score"),
            ("المعدل", "score"),
            // Admission channel
            ("channel", "channel"),
            ("admission channel", "channel"),
            ("قناة القبول", "channel"),
            // Preferences
            ("choice_1", "choice_1"),
            ("choice 1", "choice_1"),
            ("first choice", "choice_1"),
            ("الاختيار الأول", "choice_1"),
            ("choice_2", "choice_2"),
            ("choice 2", "choice_2"),
            ("second choice", "choice_2"),
            ("الاختيار الثاني", "choice_2"),
            ("choice_3", "choice_3"),
            ("choice 3", "choice_3"),
            ("third choice", "choice_3"),
            ("الاختيار الثالث", "choice_3"),
            // Privilege markers
            ("notes", "notes"),
            ("ملاحظات", "notes"),
            ("privileged", "privileged"),
            ("faculty child", "privileged"),
        ];

        HEADER_TO_FIELD
            .iter()
            .map(|(header, field)| (normalize_header(header), *field))
            .collect()
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(header: &str) -> Option<&'static str> {
    field_for_normalized(&normalize_header(header))
}
