// src/watch/patterns.rs

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::config::Configuration;
use crate::errors::Result;
use crate::types::Classification;

/// A compiled set of path-fragment patterns.
///
/// Patterns are case-insensitive. `*` stands for one or more arbitrary
/// characters; everything else is literal. A pattern matches a path fragment
/// delimited by `/` or the ends of the path:
///
/// - `public` matches `/public`, `/public/index.html`, `/web/public/x.css`
/// - `*.log` matches `/app.log`, `/logs/today.log`
/// - `/dist` only matches `dist` directly under the watch root
///
/// An empty set never matches.
#[derive(Clone)]
pub struct PatternMatcher {
    patterns: Vec<String>,
    regex: Option<Regex>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternMatcher {
    /// Compile all patterns into a single alternation.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();

        if patterns.is_empty() {
            return Ok(Self {
                patterns,
                regex: None,
            });
        }

        let alternatives: Vec<String> = patterns.iter().map(|p| pattern_to_regex(p)).collect();
        let regex = RegexBuilder::new(&format!("(?:{})", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            patterns,
            regex: Some(regex),
        })
    }

    /// Source patterns this matcher was compiled from.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if any pattern matches somewhere in the normalized path
    /// (e.g. `"/src/main.js"`).
    pub fn is_match(&self, normalized_path: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(normalized_path),
            None => false,
        }
    }
}

/// Translate one glob-like pattern into an (unwrapped) regex alternative.
fn pattern_to_regex(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    let (anchor, body) = match pattern.strip_prefix('/') {
        Some(rest) => ("^/", rest.to_string()),
        None => ("(?:^|/)", pattern),
    };

    let body = body
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".+");

    format!("{anchor}{body}(?:$|/)")
}

/// Classifies changed paths as ignored, live-reloadable or restart-worthy.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    ignore: PatternMatcher,
    live: PatternMatcher,
}

impl PathClassifier {
    pub fn new(ignore: PatternMatcher, live: PatternMatcher) -> Self {
        Self { ignore, live }
    }

    pub fn from_config(cfg: &Configuration) -> Result<Self> {
        Ok(Self::new(
            PatternMatcher::compile(cfg.ignore_patterns())?,
            PatternMatcher::compile(cfg.live_patterns())?,
        ))
    }

    /// Classify a path relative to the working directory (`"src/app.js"`,
    /// `"/src/app.js"` and `"src\\app.js"` are all accepted).
    pub fn classify(&self, relative_path: &str) -> Classification {
        classify(&normalize(relative_path), &self.ignore, &self.live)
    }

    pub fn ignore(&self) -> &PatternMatcher {
        &self.ignore
    }

    pub fn live(&self) -> &PatternMatcher {
        &self.live
    }
}

/// Ignore is checked first, then live; everything else restarts.
pub fn classify(
    normalized_path: &str,
    ignore: &PatternMatcher,
    live: &PatternMatcher,
) -> Classification {
    if ignore.is_match(normalized_path) {
        Classification::Ignored
    } else if live.is_match(normalized_path) {
        Classification::Live
    } else {
        Classification::Restart
    }
}

/// Forward slashes, exactly one leading `/`.
pub fn normalize(relative_path: &str) -> String {
    let path = relative_path.replace('\\', "/");
    let path = path.trim_start_matches("./").trim_start_matches('/');
    format!("/{path}")
}
