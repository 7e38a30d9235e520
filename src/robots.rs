//! robots.txt gate.
//!
//! Before a feed is fetched its site's `robots.txt` is consulted.  The gate
//! fails open: a missing file, an unreachable host, an unparseable URL and
//! garbage content all mean "allowed".  Nothing here is retried.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::source::DataSource;

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    groups: Vec<Group>,
}

/// One `User-agent` block: the agents it names and the rules under them.
#[derive(Debug, Clone, Default)]
struct Group {
    /// Lowercased product tokens, or `*`.
    agents: Vec<String>,
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl RobotsTxt {
    /// Parse robots.txt content.  Unknown directives and lines that are not
    /// `key: value` pairs are skipped.
    pub fn parse(content: &str) -> Self {
        let mut groups = Vec::new();
        let mut current = Group::default();
        // Set once the current group has seen a rule line; the next
        // `User-agent` then starts a new group instead of extending this one.
        let mut in_rules = false;

        for line in content.lines() {
            let line = line.find('#').map_or(line, |i| &line[..i]).trim();
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if in_rules {
                        groups.push(std::mem::take(&mut current));
                        in_rules = false;
                    }
                    current.agents.push(value.to_lowercase());
                }
                "allow" | "disallow" => {
                    if current.agents.is_empty() {
                        continue;
                    }
                    in_rules = true;
                    // An empty `Disallow:` allows everything, same as no rule.
                    if !value.is_empty() {
                        current.rules.push(Rule {
                            allow: directive == "allow",
                            pattern: percent_decode(value),
                        });
                    }
                }
                _ => {}
            }
        }

        if !current.agents.is_empty() {
            groups.push(current);
        }

        Self { groups }
    }

    /// Check whether `path` (path plus query, percent-decoded) may be fetched
    /// by `user_agent`.
    ///
    /// Groups naming the agent's product token win over `*` groups.  Among
    /// the matching rules the longest pattern decides; `Allow` wins a tie.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let token = product_token(user_agent);

        let named: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| *a == token))
            .collect();
        let applicable = if named.is_empty() {
            self.groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .collect()
        } else {
            named
        };

        let mut best: Option<&Rule> = None;
        for rule in applicable.iter().flat_map(|g| g.rules.iter()) {
            if !pattern_matches(&rule.pattern, path) {
                continue;
            }
            best = match best {
                Some(b)
                    if b.pattern.len() > rule.pattern.len()
                        || (b.pattern.len() == rule.pattern.len() && b.allow) =>
                {
                    Some(b)
                }
                _ => Some(rule),
            };
        }

        best.map_or(true, |r| r.allow)
    }
}

/// `Foo-Bot/1.2 (+https://...)` → `foo-bot`.
fn product_token(user_agent: &str) -> String {
    user_agent
        .split(['/', ' '])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Match a robots path pattern: `*` matches any run of characters, a
/// trailing `$` anchors the pattern to the end of the path, anything else is
/// a prefix match.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    if parts.is_empty() {
        return !anchored || rest.is_empty();
    }

    for (i, part) in parts.iter().enumerate() {
        if anchored && i == parts.len() - 1 {
            return rest.ends_with(part);
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Decides whether a feed URL may be polled.
pub struct RobotsGate {
    source: Arc<dyn DataSource>,
    user_agent: String,
}

impl RobotsGate {
    pub fn new(source: Arc<dyn DataSource>, user_agent: impl Into<String>) -> Self {
        Self {
            source,
            user_agent: user_agent.into(),
        }
    }

    /// Fetch `{origin}/robots.txt` for `feed_url` and evaluate it.
    ///
    /// Always resolves; every failure along the way means allowed.
    pub async fn is_allowed(&self, feed_url: &str) -> bool {
        let url = match Url::parse(feed_url) {
            Ok(url) => url,
            Err(e) => {
                debug!(feed = %feed_url, error = %e, "unparseable feed URL, skipping robots check");
                return true;
            }
        };
        let Some(robots_url) = robots_url(&url) else {
            return true;
        };

        match self.source.fetch_text(&robots_url).await {
            Ok(body) => RobotsTxt::parse(&body).is_allowed(&self.user_agent, &request_path(&url)),
            Err(e) => {
                debug!(%robots_url, error = %e, "robots.txt unavailable, allowing");
                true
            }
        }
    }
}

fn robots_url(url: &Url) -> Option<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/robots.txt", origin.ascii_serialization()))
}

/// Path plus query as robots rules see it.  `Url` percent-encodes non-ASCII
/// paths, rules are usually written raw, so both sides are compared decoded.
fn request_path(url: &Url) -> String {
    let raw = match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    };
    percent_decode(&raw)
}

/// Decode `%XX` escapes; text that does not decode to UTF-8 is kept as is.
fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| s.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
