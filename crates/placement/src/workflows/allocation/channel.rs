use super::domain::Channel;

const MARTYRS_KEYWORDS: &[&str] = &["شهداء", "martyr"];
const PARALLEL_KEYWORDS: &[&str] = &["موازي", "parallel"];

/// Maps a free-text channel label onto a canonical [`Channel`].
///
/// Matching is by keyword containment on the trimmed, lowercased label. Anything that
/// matches no keyword, including an empty label, resolves to the default channel.
pub fn normalize_channel(raw: &str) -> Channel {
    let label = raw.trim().to_lowercase();

    if contains_any(&label, MARTYRS_KEYWORDS) {
        Channel::Martyrs
    } else if contains_any(&label, PARALLEL_KEYWORDS) {
        Channel::Parallel
    } else {
        Channel::DEFAULT
    }
}

fn contains_any(label: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| label.contains(keyword))
}
