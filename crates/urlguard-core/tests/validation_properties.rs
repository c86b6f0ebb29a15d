//! Property tests for URL canonicalization

use proptest::prelude::*;
use urlguard_core::normalize_url;

fn url_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("http"), Just("https"), Just("HTTP"), Just("Https")],
        "[a-z0-9-]{1,12}(\\.[a-z0-9]{1,8}){0,2}\\.[a-z]{2,5}",
        proptest::collection::vec("[a-zA-Z0-9._~;=-]{0,10}", 0..4),
        proptest::option::of("[ ]{0,2}[a-z0-9=&]{0,12}[ ]{0,2}"),
        proptest::option::of("[a-z0-9]{0,6}"),
    )
        .prop_map(|(scheme, host, segments, query, fragment)| {
            let mut url = format!("{}://{}", scheme, host);
            for segment in segments {
                url.push('/');
                url.push_str(&segment);
            }
            if let Some(query) = query {
                url.push('?');
                url.push_str(&query);
            }
            if let Some(fragment) = fragment {
                url.push('#');
                url.push_str(&fragment);
            }
            url
        })
}

proptest! {
    #[test]
    fn normalizing_canonical_url_is_identity(raw in url_strategy()) {
        let canonical = normalize_url(&raw).expect("generated URLs are valid");
        let again = normalize_url(canonical.as_str()).expect("canonical URLs stay valid");
        prop_assert_eq!(canonical, again);
    }

    #[test]
    fn canonical_url_has_no_fragment(raw in url_strategy()) {
        let canonical = normalize_url(&raw).expect("generated URLs are valid");
        prop_assert!(!canonical.as_str().contains('#'));
        prop_assert!(canonical.as_str().starts_with("http://") || canonical.as_str().starts_with("https://"));
    }

    #[test]
    fn non_http_schemes_are_rejected(scheme in "(ftp|file|javascript|data|ws|mailto)", rest in "[a-z]{1,10}\\.com") {
        let raw = format!("{}://{}", scheme, rest);
        prop_assert!(normalize_url(&raw).is_err());
    }
}
