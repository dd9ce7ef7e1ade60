//! Decoding of the newline-delimited JSON event stream produced by search endpoints.

use std::collections::HashMap;
use std::fmt;

/// Result identifier; upstream services use either numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ResultId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One search hit. `image` is `None` until a cover has been found.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<ResultId>,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A single line of the stream. Movie endpoints use `movie*` names for the item events.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum SearchEvent {
    #[serde(rename = "init")]
    Init {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        total: Option<u32>,
    },
    #[serde(rename = "gameStart", alias = "movieStart")]
    ItemStarted {
        #[serde(alias = "movie")]
        game: SearchResult,
    },
    #[serde(rename = "gameComplete", alias = "movieComplete")]
    ItemCompleted {
        #[serde(alias = "movie")]
        game: SearchResult,
    },
    #[serde(rename = "gameError", alias = "movieError")]
    ItemFailed {
        #[serde(rename = "gameId", alias = "movieId", default)]
        item_id: Option<ResultId>,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "end")]
    End {
        #[serde(default)]
        message: Option<String>,
        #[serde(rename = "successCount", default)]
        success_count: Option<u32>,
    },
}

/// Splits a byte stream into lines and parses each complete line.
///
/// Chunks may end mid-line (or mid-UTF-8 sequence); the tail is kept until the next newline.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SearchEvent> {
        self.buffer.extend_from_slice(chunk);
        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        complete
            .split(|b| *b == b'\n')
            .filter_map(parse_line)
            .collect()
    }

    /// Parse whatever remains after the stream closed without a trailing newline.
    pub fn finish(mut self) -> Option<SearchEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(line: &[u8]) -> Option<SearchEvent> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, line = %text, "skipping unparseable search event");
            None
        }
    }
}

/// What the search dialog should show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Searching { total: Option<u32> },
    Success,
    NoResults { message: Option<String> },
    Failed { message: Option<String> },
}

/// Results accumulated from a stream, in first-seen order.
///
/// A later event for an id already present replaces it in place. Items without an id are
/// ignored.
#[derive(Clone, Debug)]
pub struct SearchFeed {
    results: Vec<SearchResult>,
    index: HashMap<ResultId, usize>,
    failures: Vec<(Option<ResultId>, String)>,
    status: SearchStatus,
    ended: bool,
}

impl Default for SearchFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchFeed {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            index: HashMap::new(),
            failures: Vec::new(),
            status: SearchStatus::Idle,
            ended: false,
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Per-item failures reported by the endpoint.
    pub fn failures(&self) -> &[(Option<ResultId>, String)] {
        &self.failures
    }

    pub fn apply(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Init { total, .. } => {
                self.status = SearchStatus::Searching { total };
            }
            SearchEvent::ItemStarted { game } | SearchEvent::ItemCompleted { game } => {
                self.upsert(game);
            }
            SearchEvent::ItemFailed { item_id, error } => {
                let error = error.unwrap_or_default();
                tracing::debug!(id = ?item_id, error = %error, "search item failed");
                self.failures.push((item_id, error));
            }
            SearchEvent::Error { message } => {
                self.status = SearchStatus::Failed { message };
            }
            SearchEvent::End { message, .. } => {
                self.ended = true;
                self.status = if self.results.is_empty() {
                    SearchStatus::NoResults { message }
                } else {
                    SearchStatus::Success
                };
            }
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = SearchEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Settle the status when the stream closed without an `end` event.
    pub fn close(&mut self) {
        if self.ended || matches!(self.status, SearchStatus::Failed { .. }) {
            return;
        }
        self.ended = true;
        self.status = if self.results.is_empty() {
            SearchStatus::NoResults { message: None }
        } else {
            SearchStatus::Success
        };
    }

    fn upsert(&mut self, result: SearchResult) {
        let Some(id) = result.id.clone() else {
            return;
        };
        match self.index.get(&id) {
            Some(&i) => self.results[i] = result,
            None => {
                self.index.insert(id, self.results.len());
                self.results.push(result);
            }
        }
    }
}

/// Decode a complete response body into a settled feed.
pub fn collect_feed(body: &[u8]) -> SearchFeed {
    let mut decoder = LineDecoder::new();
    let mut feed = SearchFeed::new();
    feed.apply_all(decoder.push(body));
    feed.apply_all(decoder.finish());
    feed.close();
    feed
}

#[cfg(test)]
#[path = "../../tests/unit/search/stream.rs"]
mod tests;
