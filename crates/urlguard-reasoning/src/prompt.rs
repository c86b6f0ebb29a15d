//! Prompt templates
//!
//! Templates use `{url}` as the only placeholder. Literal braces are written
//! doubled (`{{` and `}}`) so a template can show the model a JSON example.

/// Placeholder replaced by the URL under analysis
pub const URL_PLACEHOLDER: &str = "{url}";

/// Prompt used when the caller does not supply one
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a web security analyst. Decide whether the URL below is safe or suspicious.

Look for:
- phishing patterns such as fake login pages and typosquatted brands
- malware or drive-by download hosting
- misleading or randomly generated domain names
- obfuscation such as encoded characters, raw IP hosts or excessive subdomains
- top-level domains commonly abused for abuse campaigns

URL to analyze: {url}

Reply with a single JSON object and nothing else:
{{
    "decision": "safe" or "suspicious",
    "confidence": a number between 0.0 and 1.0,
    "reasoning": "one or two sentences",
    "threat_type": "phishing" | "malware" | "scam" | "safe"
}}
"#;

/// Substitute `url` into `template`.
///
/// Every `{url}` is replaced and doubled braces collapse to single ones. Any
/// other brace is copied through unchanged.
pub fn render_prompt(template: &str, url: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + url.len());
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        prompt.push_str(&rest[..idx]);
        rest = &rest[idx..];

        if let Some(tail) = rest.strip_prefix(URL_PLACEHOLDER) {
            prompt.push_str(url);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("{{") {
            prompt.push('{');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("}}") {
            prompt.push('}');
            rest = tail;
        } else {
            prompt.push_str(&rest[..1]);
            rest = &rest[1..];
        }
    }

    prompt.push_str(rest);
    prompt
}
