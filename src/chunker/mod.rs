//! Splits heterogeneous scraped topic records into bounded-size passages.
//!
//! Every passage keeps a visible title line prefixed to its body; retrieval
//! relevance depends on keyword overlap with that title text, so topic
//! assemblers never strip it. Oversized bodies are split with a fixed sliding
//! window so adjacent pieces share overlap across a cut.

pub mod topics;

use serde_json::{Map, Value};

/// Sliding window size, in characters, for oversized bodies.
pub const CHUNK_SIZE: usize = 800;
/// Characters shared between consecutive window chunks.
pub const CHUNK_OVERLAP: usize = 100;
/// Maximum combined `"{title}\n\n{content}"` length before splitting.
pub const MAX_COMBINED_SIZE: usize = 1000;

/// Placeholder rendered for absent source fields.
///
/// Keeping the literal in the text (rather than omitting the line) preserves a
/// fixed format for pattern-based fee/date extraction downstream.
pub const NA: &str = "N/A";

/// Identifies one scraped topic file and its chunking rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    AboutUs,
    Internship,
    Precat,
    ModularCourses,
    McqCourse,
    Contact,
}

impl Topic {
    /// All topics in load order.
    pub const ALL: [Topic; 6] = [
        Topic::AboutUs,
        Topic::Internship,
        Topic::Precat,
        Topic::ModularCourses,
        Topic::McqCourse,
        Topic::Contact,
    ];

    /// Stable identifier used in logs and source-path mapping.
    pub fn key(self) -> &'static str {
        match self {
            Topic::AboutUs => "about_us",
            Topic::Internship => "internship",
            Topic::Precat => "precat",
            Topic::ModularCourses => "modular_courses",
            Topic::McqCourse => "mcq_course",
            Topic::Contact => "contact",
        }
    }
}

/// A bounded-size passage of text plus descriptive metadata, the atomic unit
/// indexed for retrieval.
///
/// `metadata` always carries `page`, `section_type`, `source`, and `url`;
/// topic assemblers add optional keys (`course_name`, `technology`, ...).
/// Chunks are immutable once produced; a fresh load supersedes, never merges.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl Chunk {
    /// Creates a chunk with the four required metadata keys populated.
    pub fn new(
        content: impl Into<String>,
        page: &str,
        section_type: &str,
        url: &str,
        source: &str,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("page".into(), Value::from(page));
        metadata.insert("section_type".into(), Value::from(section_type));
        metadata.insert("source".into(), Value::from(source));
        metadata.insert("url".into(), Value::from(url));
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Adds an optional metadata key.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Convenience accessor for string-valued metadata.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Splits `text` into windows of [`CHUNK_SIZE`] characters overlapping by
/// [`CHUNK_OVERLAP`]. Texts at or under the window size come back whole.
///
/// Operates on characters, not bytes, so multi-byte content never splits
/// mid-codepoint.
pub fn simple_chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= CHUNK_SIZE {
        return vec![text.to_string()];
    }
    let step = CHUNK_SIZE - CHUNK_OVERLAP;
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = usize::min(start + CHUNK_SIZE, chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }
    chunks
}

/// Tests `"{title}\n\n{content}"` against [`MAX_COMBINED_SIZE`]; returns the
/// body as a single chunk when it fits, otherwise the sliding-window split of
/// the body alone.
pub fn chunk_text_if_large(title: &str, content: &str) -> Vec<String> {
    let combined_len = title.chars().count() + 2 + content.chars().count();
    if combined_len <= MAX_COMBINED_SIZE {
        vec![content.to_string()]
    } else {
        simple_chunk_text(content)
    }
}

/// Chunks accordion-style `{title, content}` sections shared by several topics.
///
/// Empty-content sections are skipped. Split sections get `chunk_index` /
/// `total_chunks` so a consumer can detect and reassemble a cut passage.
pub fn chunk_sections(sections: &Value, page: &str, url: &str, source: &str) -> Vec<Chunk> {
    let mut docs = Vec::new();
    let Some(sections) = sections.as_array() else {
        return docs;
    };
    for section in sections {
        let title = section.get("title").and_then(Value::as_str).unwrap_or("");
        let content = section
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        if content.is_empty() {
            continue;
        }
        let pieces = chunk_text_if_large(title, content);
        let total = pieces.len();
        for (index, piece) in pieces.into_iter().enumerate() {
            let mut doc = Chunk::new(
                format!("{title}\n\n{piece}"),
                page,
                "accordion",
                url,
                source,
            )
            .with("section_title", title);
            if total > 1 {
                doc = doc
                    .with("chunk_index", index as u64)
                    .with("total_chunks", total as u64);
            }
            docs.push(doc);
        }
    }
    docs
}

/// Runs the topic-specific assembly rule for `topic` over its raw record.
///
/// Deterministic given identical input, producing chunks in stable insertion
/// order; "list everything" answers enumerate results in this order.
pub fn chunk_topic(topic: Topic, data: &Value) -> Vec<Chunk> {
    match topic {
        Topic::AboutUs => topics::chunk_about_us(data),
        Topic::Internship => topics::chunk_internship(data),
        Topic::Precat => topics::chunk_precat(data),
        Topic::ModularCourses => topics::chunk_modular_courses(data),
        Topic::McqCourse => topics::chunk_mcq_course(data),
        Topic::Contact => topics::chunk_contact(data),
    }
}

/// Returns the string field `key` of `value`, or [`NA`] when absent.
pub(crate) fn field_or_na<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(NA)
}
