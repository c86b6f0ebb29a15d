//! Lexical feature extraction

use urlguard_core::{split_url, FeatureVector};

/// Derive the feature vector for a canonical URL.
///
/// Host and path come from the same textual split canonicalization uses, so
/// numeric and IDN hosts are measured as written. Pure and infallible: a URL
/// without a scheme contributes an empty host and path, and every ratio or
/// mean over nothing is 0.0.
pub fn extract_features(url: &str) -> FeatureVector {
    let parts = split_url(url);
    let host = parts.as_ref().map(|p| p.host()).unwrap_or_default();
    let path = parts.as_ref().map_or("", |p| p.path);

    FeatureVector {
        digit_ratio_in_host: digit_ratio(&host),
        avg_token_length_url: average_token_length(url),
        avg_token_length_path: average_token_length(path),
    }
}

fn digit_ratio(host: &str) -> f64 {
    let len = host.chars().count();
    if len == 0 {
        return 0.0;
    }
    let digits = host.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / len as f64
}

/// Mean length of the alphanumeric runs in `value`
fn average_token_length(value: &str) -> f64 {
    let (count, total) = value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .fold((0usize, 0usize), |(count, total), token| {
            (count + 1, total + token.len())
        });

    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
