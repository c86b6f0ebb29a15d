//! Textual URL splitting
//!
//! Splits a URL into its components without re-encoding anything, so the
//! authority and path come back exactly as the client wrote them. Numeric
//! hosts stay numeric, IDN hosts keep their Unicode labels and dot segments
//! survive in the path.

/// Components of a URL, borrowed from the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    /// Scheme as written (not lowercased)
    pub scheme: &'a str,
    /// Everything between `//` and the path, including userinfo and port
    pub authority: &'a str,
    pub path: &'a str,
    /// Text after the first `?`, if present
    pub query: Option<&'a str>,
    /// Text after the first `#`, if present
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Host name from the authority, lowercased with userinfo, port and IPv6
    /// brackets removed. Empty when the authority has no host.
    pub fn host(&self) -> String {
        let host_port = self
            .authority
            .rsplit_once('@')
            .map_or(self.authority, |(_, host)| host);

        let host = match host_port.strip_prefix('[') {
            Some(bracketed) => bracketed.split(']').next().unwrap_or_default(),
            None => host_port.split(':').next().unwrap_or_default(),
        };

        host.to_lowercase()
    }

    /// Path with the `;params` of its last segment removed
    pub fn path_without_params(&self) -> &'a str {
        let segment_start = self.path.rfind('/').map_or(0, |i| i + 1);
        match self.path[segment_start..].find(';') {
            Some(semicolon) => &self.path[..segment_start + semicolon],
            None => self.path,
        }
    }
}

/// Split `url` into its components.
///
/// Returns `None` when the string has no syntactically valid scheme. The
/// authority is only recognized after a literal `//` and ends at the first
/// `/`, `?` or `#`; anything else leaves it empty.
pub fn split_url(url: &str) -> Option<UrlParts<'_>> {
    let (scheme, rest) = url.split_once(':')?;
    if !is_valid_scheme(scheme) {
        return None;
    }

    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (rest, None),
    };

    let (authority, rest) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find(|c: char| c == '/' || c == '?').unwrap_or(after.len());
            after.split_at(end)
        }
        None => ("", rest),
    };

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    Some(UrlParts {
        scheme,
        authority,
        path,
        query,
        fragment,
    })
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
