//! Typed tweet schema and HTML rendering of tweet entities.
//!
//! The platform's payloads drifted across API versions: `text` became
//! `full_text`, `user_mentions` became `mentions`, index pairs became
//! `start`/`end` fields. The variants are reconciled here, once, at the
//! deserialization boundary, so the rest of the crate sees one shape.

use serde::Deserialize;

/// One status, with the field-name drift already normalized.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub id_str: Option<String>,
    #[serde(alias = "full_text")]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entities: Option<Entities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Vec<Hashtag>,
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
    #[serde(default, alias = "user_mentions")]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hashtag {
    #[serde(alias = "text")]
    pub tag: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub indices: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlEntity {
    pub url: String,
    #[serde(default)]
    pub expanded_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub indices: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mention {
    #[serde(alias = "screen_name")]
    pub username: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub indices: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub indices: Option<(usize, usize)>,
}

/// Reconciles `start`/`end` fields with legacy `indices` pairs. Offsets
/// count Unicode scalar values, not bytes.
fn resolve_span(
    start: Option<usize>,
    end: Option<usize>,
    indices: Option<(usize, usize)>,
) -> Option<(usize, usize)> {
    match (start, end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => indices,
    }
}

impl Hashtag {
    pub fn span(&self) -> Option<(usize, usize)> {
        resolve_span(self.start, self.end, self.indices)
    }
}

impl UrlEntity {
    pub fn span(&self) -> Option<(usize, usize)> {
        resolve_span(self.start, self.end, self.indices)
    }
}

impl Mention {
    pub fn span(&self) -> Option<(usize, usize)> {
        resolve_span(self.start, self.end, self.indices)
    }
}

impl Media {
    pub fn span(&self) -> Option<(usize, usize)> {
        resolve_span(self.start, self.end, self.indices)
    }
}

/// Renders a tweet as HTML with links, @usernames and #hashtags turned
/// into anchors. All text is escaped.
pub fn clickable(tweet: &Tweet) -> String {
    let entities = match &tweet.entities {
        Some(entities) => entities,
        None => return escape(&tweet.text),
    };

    // (start, end, href, label)
    let mut links: Vec<(usize, usize, String, String)> = Vec::new();
    for item in &entities.hashtags {
        if let Some((start, end)) = item.span() {
            links.push((
                start,
                end,
                format!("https://x.com/search?q=%23{}", item.tag),
                format!("#{}", item.tag),
            ));
        }
    }
    for item in &entities.urls {
        if let Some((start, end)) = item.span() {
            let href = item.expanded_url.as_deref().unwrap_or(&item.url);
            let label = item.display_url.as_deref().unwrap_or(&item.url);
            links.push((start, end, href.to_string(), label.to_string()));
        }
    }
    for item in &entities.mentions {
        if let Some((start, end)) = item.span() {
            links.push((
                start,
                end,
                format!("https://x.com/{}", item.username),
                format!("@{}", item.username),
            ));
        }
    }
    for item in &entities.media {
        if let Some((start, end)) = item.span() {
            let label = item.display_url.as_deref().unwrap_or(&item.url);
            links.push((start, end, item.url.clone(), label.to_string()));
        }
    }
    links.sort_by_key(|&(start, ..)| start);

    // entity offsets count characters, so splice over a char vector
    let chars: Vec<char> = tweet.text.chars().collect();
    let mut out = String::new();
    let mut pos = 0;
    for (start, end, href, label) in links {
        if start < pos || start > chars.len() {
            continue;
        }
        out.push_str(&escape(&chars[pos..start].iter().collect::<String>()));
        out.push_str(&format!("<a href=\"{}\">{}</a>", escape(&href), escape(&label)));
        pos = end.min(chars.len());
    }
    out.push_str(&escape(&chars[pos..].iter().collect::<String>()));
    out
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
