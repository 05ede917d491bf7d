//! Query routing: classify a question into a handling strategy, then answer.
//!
//! Classification is a pure, ordered keyword check producing an [`Intent`];
//! dispatch happens separately in [`QueryRouter::answer`], so the priority
//! order and each predicate stay independently testable. Matching is
//! case-insensitive substring matching, not tokenized or stemmed; the
//! domain's vocabulary is narrow enough that this stays deliberately simple.

pub mod prompts;

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::generation::{CompletionGateway, ProviderSelection};
use crate::stores::{QueryHit, VectorStore};
use crate::types::{ChatTurn, RagError};

/// Retrieval depth for contact extraction.
const CONTACT_K: usize = 5;
/// Fee figures are often buried in low-ranked table passages; dig deeper.
const FEE_K: usize = 15;
/// Depth for broad ("all/every/list") generate questions.
const BROAD_K: usize = 10;
/// Depth for everything else.
const DEFAULT_K: usize = 6;

const CONTACT_KEYWORDS: [&str; 6] = ["email", "contact", "phone", "number", "address", "reach"];
/// A contact-flavored question about a specific program ("contact for the
/// internship program") must not short-circuit to generic contact info.
const PROGRAM_QUALIFIERS: [&str; 4] = ["course", "program", "internship", "precat"];
const FEE_KEYWORDS: [&str; 5] = ["fee", "fees", "cost", "price", "charge"];
const FEE_QUALIFIERS: [&str; 8] = [
    "internship",
    "course",
    "program",
    "precat",
    "mern",
    "genai",
    "java",
    "python",
];
const BROAD_KEYWORDS: [&str; 3] = ["all", "every", "list"];

/// Similarity search over an enumeration request is unreliable (no single
/// most-similar passage covers the whole set), so these listing questions
/// match exactly and scan the full index instead.
const PROGRAM_LIST_PHRASES: [&str; 7] = [
    "list internship programs",
    "list all internship programs",
    "what are the internship programs",
    "what internship programs are available",
    "show all internship programs",
    "give me internship programs",
    "all internship programs",
];
const COURSE_LIST_PHRASES: [&str; 10] = [
    "list all courses",
    "list courses",
    "what are the courses",
    "what courses are available",
    "show all courses",
    "give me the list of all the courses",
    "all courses",
    "list all modular courses",
    "what are the modular courses",
    "give me the list of all the courses at sunbeam",
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\+\d][\d\-\(\)\s]{8,}[\d]").expect("phone regex"));

const CONTACT_FALLBACK: &str =
    "Contact info not found. Visit: https://www.sunbeaminfo.in/contact-us";
const PROGRAMS_FALLBACK: &str = "No internship programs found.";
const COURSES_FALLBACK: &str = "I couldn't find the complete course list. \
     Please visit https://www.sunbeaminfo.in/modular-courses for details.";

/// Handling strategy for one question. Evaluated in a fixed priority order;
/// a question matching multiple triggers resolves to the earliest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Exact data extracted by regex from retrieved text; no generation.
    Contact,
    /// Deep retrieval plus a fee-specific generation prompt.
    Fee,
    /// Full-scan aggregation of internship (technology, location) pairs.
    ListPrograms,
    /// Full-scan aggregation of modular course names.
    ListCourses,
    /// Retrieval plus the general generation prompt. `broad` widens k.
    Generate { broad: bool },
}

/// Classifies a question. Pure; priority order is
/// contact → fee → enumerate-programs → enumerate-courses → generate.
pub fn classify(question: &str) -> Intent {
    let lowered = question.to_lowercase();
    let q = lowered.trim();
    let has = |keywords: &[&str]| keywords.iter().any(|kw| q.contains(kw));

    if has(&CONTACT_KEYWORDS) && !has(&PROGRAM_QUALIFIERS) {
        Intent::Contact
    } else if has(&FEE_KEYWORDS) && has(&FEE_QUALIFIERS) {
        Intent::Fee
    } else if PROGRAM_LIST_PHRASES.contains(&q) {
        Intent::ListPrograms
    } else if COURSE_LIST_PHRASES.contains(&q) {
        Intent::ListCourses
    } else {
        Intent::Generate {
            broad: has(&BROAD_KEYWORDS),
        }
    }
}

/// Per-call context supplied by the front end: which backend to generate
/// with and any prior turns worth considering. Never ambient, never global.
#[derive(Clone, Debug)]
pub struct QueryContext {
    pub selection: ProviderSelection,
    pub history: Vec<ChatTurn>,
}

impl QueryContext {
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            selection,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Final answer plus provenance.
#[derive(Clone, Debug, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<QueryHit>,
}

/// Orchestration core: classifies, retrieves, and answers.
pub struct QueryRouter {
    store: Arc<dyn VectorStore>,
    completions: Arc<dyn CompletionGateway>,
}

impl QueryRouter {
    pub fn new(store: Arc<dyn VectorStore>, completions: Arc<dyn CompletionGateway>) -> Self {
        Self { store, completions }
    }

    /// Answers one question synchronously end-to-end. Deterministic intents
    /// (contact, enumerations) always return best-effort text; generation
    /// intents surface backend failures as errors rather than crafted
    /// answers.
    pub async fn answer(
        &self,
        question: &str,
        ctx: &QueryContext,
    ) -> Result<RagAnswer, RagError> {
        let intent = classify(question);
        tracing::info!(?intent, "routing question");
        match intent {
            Intent::Contact => self.handle_contact(question).await,
            Intent::Fee => self.handle_fee(question, ctx).await,
            Intent::ListPrograms => self.handle_list_programs().await,
            Intent::ListCourses => self.handle_list_courses().await,
            Intent::Generate { broad } => self.handle_generate(question, ctx, broad).await,
        }
    }

    /// Contact data is exact; regex extraction from retrieved text beats
    /// generation, so the generation backend is never invoked here.
    async fn handle_contact(&self, question: &str) -> Result<RagAnswer, RagError> {
        let hits = self.store.search(question, CONTACT_K).await?;
        let context = join_documents(&hits);

        let emails = extract_emails(&context);
        let phones = extract_phones(&context);

        let mut answer = String::new();
        if !emails.is_empty() {
            answer.push_str(&format!("\u{1f4e7} Email: {}", emails.join(", ")));
        }
        if !phones.is_empty() {
            if !answer.is_empty() {
                answer.push('\n');
            }
            let shown: Vec<&str> = phones.iter().take(2).map(String::as_str).collect();
            answer.push_str(&format!("\u{1f4de} Phone: {}", shown.join(", ")));
        }
        if answer.is_empty() {
            answer = CONTACT_FALLBACK.to_string();
        }
        Ok(RagAnswer {
            answer,
            sources: hits,
        })
    }

    async fn handle_fee(
        &self,
        question: &str,
        ctx: &QueryContext,
    ) -> Result<RagAnswer, RagError> {
        let hits = self.store.search(question, FEE_K).await?;
        let context = join_documents(&hits);
        let prompt = prompts::fee_prompt(question, &context);
        let answer = self.completions.complete(&ctx.selection, &prompt).await?;
        Ok(RagAnswer {
            answer,
            sources: hits,
        })
    }

    async fn handle_list_programs(&self) -> Result<RagAnswer, RagError> {
        let documents = self.store.scan_all().await?;

        let mut seen = HashSet::new();
        let mut programs: Vec<(String, String)> = Vec::new();
        for doc in &documents {
            if doc.meta_str("page") != Some("internship")
                || doc.meta_str("section_type") != Some("program")
            {
                continue;
            }
            let technology = doc.meta_str("technology").unwrap_or("Unknown");
            if technology == crate::chunker::NA {
                continue;
            }
            let location = doc.meta_str("location").unwrap_or("Unknown");
            if seen.insert(format!("{technology}|{location}")) {
                programs.push((technology.to_string(), location.to_string()));
            }
        }

        if programs.is_empty() {
            return Ok(RagAnswer {
                answer: PROGRAMS_FALLBACK.to_string(),
                sources: Vec::new(),
            });
        }

        let mut answer = String::from("**Internship programs at Sunbeam:**\n\n");
        for (index, (technology, location)) in programs.iter().enumerate() {
            answer.push_str(&format!("{}. **{technology}** - {location}\n", index + 1));
        }
        answer.push_str(&format!(
            "\nTotal: {} programs available",
            programs.len()
        ));
        Ok(RagAnswer {
            answer,
            sources: Vec::new(),
        })
    }

    async fn handle_list_courses(&self) -> Result<RagAnswer, RagError> {
        let documents = self.store.scan_all().await?;

        let mut seen = HashSet::new();
        let mut courses: Vec<(String, String)> = Vec::new();
        for doc in &documents {
            if doc.meta_str("page") != Some("modular_courses")
                || doc.meta_str("section_type") != Some("course_detail")
            {
                continue;
            }
            let Some(name) = doc.meta_str("course_name") else {
                continue;
            };
            if name.is_empty() || name == "Unknown" {
                continue;
            }
            if seen.insert(name.to_string()) {
                let duration = doc.meta_str("duration").unwrap_or(crate::chunker::NA);
                courses.push((name.to_string(), duration.to_string()));
            }
        }

        if courses.is_empty() {
            return Ok(RagAnswer {
                answer: COURSES_FALLBACK.to_string(),
                sources: Vec::new(),
            });
        }

        courses.sort_by(|a, b| a.0.cmp(&b.0));
        let mut answer = String::from("**Modular Courses at Sunbeam:**\n\n");
        for (index, (name, duration)) in courses.iter().enumerate() {
            answer.push_str(&format!(
                "{}. **{name}** - Duration: {duration}\n",
                index + 1
            ));
        }
        answer.push_str(&format!("\nTotal: {} courses available", courses.len()));
        Ok(RagAnswer {
            answer,
            sources: Vec::new(),
        })
    }

    async fn handle_generate(
        &self,
        question: &str,
        ctx: &QueryContext,
        broad: bool,
    ) -> Result<RagAnswer, RagError> {
        let limit = if broad { BROAD_K } else { DEFAULT_K };
        let hits = self.store.search(question, limit).await?;
        let context = join_documents(&hits);
        let prompt = prompts::general_prompt(question, &context, &ctx.history);
        let answer = self.completions.complete(&ctx.selection, &prompt).await?;
        Ok(RagAnswer {
            answer,
            sources: hits,
        })
    }
}

fn join_documents(hits: &[QueryHit]) -> String {
    hits.iter()
        .map(|hit| hit.document.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First-seen-order deduplicated email matches.
pub(crate) fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|email| seen.insert(email.clone()))
        .collect()
}

/// First-seen-order deduplicated phone matches.
pub(crate) fn extract_phones(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|phone| seen.insert(phone.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_without_qualifier() {
        assert_eq!(classify("What is your email?"), Intent::Contact);
        assert_eq!(classify("how can I REACH you"), Intent::Contact);
    }

    #[test]
    fn contact_with_program_qualifier_falls_through() {
        // "contact for the internship program" must not short-circuit.
        assert_eq!(
            classify("what is the contact for the internship program"),
            Intent::Generate { broad: false }
        );
    }

    #[test]
    fn fee_requires_both_keyword_sets() {
        assert_eq!(classify("what are the fees for internship"), Intent::Fee);
        assert_eq!(classify("fees of the java course"), Intent::Fee);
        // Fee word without a qualifier goes to generate.
        assert!(matches!(
            classify("what is the fee"),
            Intent::Generate { .. }
        ));
    }

    #[test]
    fn enumeration_requires_exact_phrase() {
        assert_eq!(classify("list all courses"), Intent::ListCourses);
        assert_eq!(classify("  List All Courses  "), Intent::ListCourses);
        assert_eq!(
            classify("list all internship programs"),
            Intent::ListPrograms
        );
        // A near miss is a broad generate question instead.
        assert_eq!(
            classify("please list all courses now"),
            Intent::Generate { broad: true }
        );
    }

    #[test]
    fn priority_order_is_fixed() {
        // Contains fee keywords and an exact course-listing overlap would be
        // impossible; but fee beats the generate fallback:
        assert_eq!(classify("internship cost?"), Intent::Fee);
        // Contact wins over fee when no qualifier present.
        assert_eq!(classify("phone number and price"), Intent::Contact);
    }

    #[test]
    fn generate_scope_detection() {
        assert_eq!(
            classify("tell me about sunbeam"),
            Intent::Generate { broad: false }
        );
        assert_eq!(
            classify("what does every batch include"),
            Intent::Generate { broad: true }
        );
    }

    #[test]
    fn email_extraction_dedups_in_order() {
        let text = "Write to info@sunbeaminfo.com or hr@sunbeaminfo.com; \
                    again info@sunbeaminfo.com.";
        assert_eq!(
            extract_emails(text),
            vec!["info@sunbeaminfo.com", "hr@sunbeaminfo.com"]
        );
    }

    #[test]
    fn phone_extraction_matches_formatted_numbers() {
        let text = "Call +91 20 2421 1234 or 020-2421-5678 today.";
        let phones = extract_phones(text);
        assert_eq!(phones.len(), 2);
        assert!(phones[0].starts_with("+91"));
    }
}
