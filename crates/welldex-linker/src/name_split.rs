//! Splits an asset name into candidate operator-name segments on the
//! separators a raw source commonly uses to glue an operator prefix onto a
//! well/unit name (spec.md §4.5).

const SEPARATORS: [char; 4] = ['-', '–', '—', '#'];

pub fn split_segments(name: &str) -> Vec<String> {
    name.split(SEPARATORS)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
