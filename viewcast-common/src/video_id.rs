//! Video identifier extraction from user-supplied URLs
//!
//! Extraction is a chain of strategies keyed by URL shape. The first strategy
//! that yields a well-formed identifier wins. [`IdentifierExtractor::legacy`]
//! keeps the original two-step split heuristic (`v=` query value, else final
//! `/` segment) so its known gaps stay visible in tests: shortened links with
//! a query (`youtu.be/ID?t=30`), playlist URLs and embedded-player URLs with
//! parameters all fail with it.

use url::Url;

use crate::{Error, Result};

/// Path segments that never carry an identifier on their own
const RESERVED_SEGMENTS: [&str; 8] = [
    "watch", "playlist", "results", "feed", "channel", "user", "c", "embed",
];

/// Path prefixes whose following segment is the identifier
const ID_PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "live", "v"];

/// Hosts serving `/<id>` short links
const SHORT_LINK_HOSTS: [&str; 2] = ["youtu.be", "www.youtu.be"];

/// One way of pulling an identifier candidate out of an input string
pub trait IdentifierStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Candidate identifier, or `None` when the input does not have this shape
    fn extract(&self, input: &str) -> Option<String>;
}

/// `...?v=<id>&...`
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParam;

impl IdentifierStrategy for QueryParam {
    fn name(&self) -> &'static str {
        "query_param"
    }

    fn extract(&self, input: &str) -> Option<String> {
        let without_fragment = input.split('#').next().unwrap_or(input);
        let (_, query) = without_fragment.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "v")
            .map(|(_, value)| value.to_string())
    }
}

/// `youtu.be/<id>`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortLink;

impl IdentifierStrategy for ShortLink {
    fn name(&self) -> &'static str {
        "short_link"
    }

    fn extract(&self, input: &str) -> Option<String> {
        let url = parse_url(input)?;
        if !SHORT_LINK_HOSTS.contains(&url.host_str()?) {
            return None;
        }
        path_segments(&url).first().map(|s| s.to_string())
    }
}

/// `/embed/<id>`, `/shorts/<id>`, `/live/<id>`, `/v/<id>`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPrefix;

impl IdentifierStrategy for PathPrefix {
    fn name(&self) -> &'static str {
        "path_prefix"
    }

    fn extract(&self, input: &str) -> Option<String> {
        let url = parse_url(input)?;
        let segments = path_segments(&url);
        segments
            .windows(2)
            .find(|pair| ID_PATH_PREFIXES.contains(&pair[0]))
            .map(|pair| pair[1].to_string())
    }
}

/// Last non-empty path segment, skipping reserved words such as `watch`
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalSegment;

impl IdentifierStrategy for FinalSegment {
    fn name(&self) -> &'static str {
        "final_segment"
    }

    fn extract(&self, input: &str) -> Option<String> {
        let url = parse_url(input)?;
        let last = *path_segments(&url).last()?;
        if RESERVED_SEGMENTS.contains(&last) {
            return None;
        }
        Some(last.to_string())
    }
}

/// Input that is already an identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct BareIdentifier;

impl IdentifierStrategy for BareIdentifier {
    fn name(&self) -> &'static str {
        "bare_identifier"
    }

    fn extract(&self, input: &str) -> Option<String> {
        is_valid_identifier(input).then(|| input.to_string())
    }
}

/// Plain string splitting: text after `v=` up to `&`, else text after the last `/`
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySplit;

impl IdentifierStrategy for LegacySplit {
    fn name(&self) -> &'static str {
        "legacy_split"
    }

    fn extract(&self, input: &str) -> Option<String> {
        let candidate = match input.split_once("v=") {
            Some((_, rest)) => rest.split('&').next().unwrap_or(rest),
            None => input.rsplit('/').next().unwrap_or(input),
        };
        Some(candidate.to_string())
    }
}

/// Ordered strategy chain
pub struct IdentifierExtractor {
    strategies: Vec<Box<dyn IdentifierStrategy>>,
}

impl IdentifierExtractor {
    pub fn new(strategies: Vec<Box<dyn IdentifierStrategy>>) -> Self {
        Self { strategies }
    }

    /// The original heuristic, unchanged
    pub fn legacy() -> Self {
        Self::new(vec![Box::new(LegacySplit)])
    }

    /// Names of the strategies in evaluation order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract an identifier.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedIdentifier`] when no strategy yields a non-empty
    /// identifier made of `[A-Za-z0-9_-]`.
    pub fn extract(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::MalformedIdentifier("empty input".to_string()));
        }

        for strategy in &self.strategies {
            if let Some(candidate) = strategy.extract(input) {
                if is_valid_identifier(&candidate) {
                    tracing::debug!(strategy = strategy.name(), id = %candidate, "Extracted video identifier");
                    return Ok(candidate);
                }
                tracing::debug!(
                    strategy = strategy.name(),
                    candidate = %candidate,
                    "Discarded malformed identifier candidate"
                );
            }
        }

        Err(Error::MalformedIdentifier(format!(
            "no video identifier found in {:?}",
            input
        )))
    }
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(BareIdentifier),
            Box::new(QueryParam),
            Box::new(ShortLink),
            Box::new(PathPrefix),
            Box::new(FinalSegment),
        ])
    }
}

/// Non-empty and only `[A-Za-z0-9_-]`
pub fn is_valid_identifier(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parse with or without a scheme (`youtu.be/abc` is common user input)
fn parse_url(input: &str) -> Option<Url> {
    match Url::parse(input) {
        Ok(url) => Some(url),
        Err(_) if !input.contains("://") && input.contains('/') => {
            Url::parse(&format!("https://{}", input)).ok()
        }
        Err(_) => None,
    }
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> Result<String> {
        IdentifierExtractor::default().extract(input)
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(extract(".../watch?v=ABC123&t=30").unwrap(), "ABC123");
        assert_eq!(
            extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLx").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_short_links() {
        assert_eq!(extract("https://youtu.be/dQw4w9WgXcQ?t=30").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(extract("youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_path_shapes() {
        assert_eq!(
            extract("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            extract("https://www.youtube.com/shorts/abc123def45").unwrap(),
            "abc123def45"
        );
        assert_eq!(extract("https://example.com/videos/xyz_789/").unwrap(), "xyz_789");
    }

    #[test]
    fn test_bare_identifier() {
        assert_eq!(extract("  dQw4w9WgXcQ ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_unusable_inputs() {
        for input in [
            "",
            "   ",
            "https://www.youtube.com/playlist?list=PLrAXtmRdnEQy",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/",
            "not a url at all",
            "https://www.youtube.com/watch?v=",
        ] {
            assert!(
                matches!(extract(input), Err(Error::MalformedIdentifier(_))),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_legacy_heuristic_limitations() {
        let legacy = IdentifierExtractor::legacy();
        assert_eq!(legacy.extract(".../watch?v=ABC123&t=30").unwrap(), "ABC123");
        assert_eq!(legacy.extract("https://youtu.be/ABC123").unwrap(), "ABC123");
        // Shortened links with a query keep the query in the final segment
        assert!(legacy.extract("https://youtu.be/ABC123?t=30").is_err());
        assert!(legacy
            .extract("https://www.youtube.com/playlist?list=PLrAXtmRdnEQy")
            .is_err());
        // Any "v=" substring is taken as the video parameter
        assert_eq!(legacy.extract("https://example.com/a?rev=7").unwrap(), "7");
    }

    #[test]
    fn test_custom_chain() {
        let extractor = IdentifierExtractor::new(vec![Box::new(ShortLink)]);
        assert_eq!(extractor.strategy_names(), vec!["short_link"]);
        assert!(extractor.extract("https://www.youtube.com/watch?v=abc").is_err());
    }
}
