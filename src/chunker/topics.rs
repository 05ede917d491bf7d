//! Per-topic assembly rules turning semi-structured records into prose chunks.
//!
//! Each rule prefixes a title line to the body and renders absent fields as
//! the literal `N/A` placeholder. Malformed records degrade per-field: a
//! missing field is never an error.

use serde_json::Value;

use super::{Chunk, NA, chunk_sections, chunk_text_if_large, field_or_na};

const ABOUT_US_URL: &str = "https://www.sunbeaminfo.in/about-us";
const INTERNSHIP_URL: &str = "https://sunbeaminfo.in/internship";
const PRECAT_URL: &str = "https://www.sunbeaminfo.in/pre-cat";
const MODULAR_COURSES_URL: &str = "https://www.sunbeaminfo.in/modular-courses-home";
const MCQ_COURSE_URL: &str = "https://www.sunbeaminfo.in/modular-courses.php?mdid=57";
const CONTACT_URL: &str = "https://www.sunbeaminfo.in/contact-us";

/// General institute description plus accordion sections.
pub fn chunk_about_us(data: &Value) -> Vec<Chunk> {
    let url = data
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or(ABOUT_US_URL);
    let mut docs = Vec::new();
    if let Some(main) = non_empty(data.get("main_description")) {
        docs.push(Chunk::new(
            format!("About Sunbeam Institute\n\n{main}"),
            "about-us",
            "main_description",
            url,
            "sunbeam_about_us",
        ));
    }
    docs.extend(chunk_sections(
        data.get("accordion_sections").unwrap_or(&Value::Null),
        "about-us",
        url,
        "sunbeam_about_us",
    ));
    docs
}

/// Internship description, accordion sections, per-technology programs, and
/// the batch schedule table.
pub fn chunk_internship(data: &Value) -> Vec<Chunk> {
    let url = INTERNSHIP_URL;
    let mut docs = Vec::new();

    if let Some(main) = non_empty(data.get("main_description")) {
        docs.push(Chunk::new(
            format!("About Sunbeam Internship\n\n{main}"),
            "internship",
            "main_description",
            url,
            "sunbeam_internship",
        ));
    }
    docs.extend(chunk_sections(
        data.get("accordion_sections").unwrap_or(&Value::Null),
        "internship",
        url,
        "sunbeam_internship",
    ));

    if let Some(programs) = data.get("programs").and_then(Value::as_array) {
        for program in programs {
            let technology = field_or_na(program, "Technology");
            let location = field_or_na(program, "Location");
            let text = format!(
                "Internship Program\n\nTechnology: {technology}\nAim: {}\nPrerequisite: {}\nLearning: {}\nLocation: {location}",
                field_or_na(program, "Aim"),
                field_or_na(program, "Prerequisite"),
                field_or_na(program, "Learning"),
            );
            docs.push(
                Chunk::new(text, "internship", "program", url, "sunbeam_internship")
                    .with("technology", technology)
                    .with("location", location),
            );
        }
    }

    if let Some(batches) = data.get("batches").and_then(Value::as_array)
        && !batches.is_empty()
    {
        let blocks: Vec<String> = batches
            .iter()
            .map(|batch| {
                format!(
                    "Batch: {}\nDuration: {}\nStart Date: {}\nEnd Date: {}\nTime: {}\nFees: {}",
                    field_or_na(batch, "Batch"),
                    field_or_na(batch, "Batch Duration"),
                    field_or_na(batch, "Start Date"),
                    field_or_na(batch, "End Date"),
                    field_or_na(batch, "Time"),
                    field_or_na(batch, "Fees (Rs.)"),
                )
            })
            .collect();
        let text = format!("Internship Batches Schedule\n\n{}", blocks.join("\n\n"));
        docs.push(
            Chunk::new(text, "internship", "batch_schedule", url, "sunbeam_internship")
                .with("total_batches", batches.len() as u64),
        );
    }

    docs
}

/// Pre-CAT page: accordion sections only.
pub fn chunk_precat(data: &Value) -> Vec<Chunk> {
    chunk_sections(
        data.get("accordion_sections").unwrap_or(&Value::Null),
        "pre-cat",
        PRECAT_URL,
        "sunbeam_precat",
    )
}

/// Modular course listing: one overview chunk plus one detail chunk per course.
///
/// The record is either a bare array of courses or `{"courses": [...]}`.
pub fn chunk_modular_courses(data: &Value) -> Vec<Chunk> {
    let empty = Vec::new();
    let courses = data
        .as_array()
        .or_else(|| data.get("courses").and_then(Value::as_array))
        .unwrap_or(&empty);
    if courses.is_empty() {
        return Vec::new();
    }

    let mut docs = Vec::new();
    let bullet_lines: Vec<String> = courses
        .iter()
        .map(|course| {
            format!(
                "• {} - Duration: {}",
                field_or_na(course, "course_name"),
                field_or_na(course, "duration"),
            )
        })
        .collect();
    docs.push(
        Chunk::new(
            format!("Sunbeam Modular Courses\n\n{}", bullet_lines.join("\n")),
            "modular_courses",
            "courses_overview",
            MODULAR_COURSES_URL,
            "sunbeam_modular_courses",
        )
        .with("total_courses", courses.len() as u64),
    );

    for course in courses {
        let name = course
            .get("course_name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        let duration = field_or_na(course, "duration");
        let link = course.get("link").and_then(Value::as_str).unwrap_or("");

        let mut text = format!("Course: {name}\nDuration: {duration}");
        if !link.is_empty() && link != NA {
            text.push_str(&format!("\nMore Information: {link}"));
        }
        let url = if !link.is_empty() && link != NA {
            link
        } else {
            MODULAR_COURSES_URL
        };
        docs.push(
            Chunk::new(text, "modular_courses", "course_detail", url, "sunbeam_modular_courses")
                .with("course_name", name)
                .with("duration", duration),
        );
    }
    docs
}

/// Single-course page (the "Mastering MCQs" style layout): basic info block
/// plus titled sections.
pub fn chunk_mcq_course(data: &Value) -> Vec<Chunk> {
    let name = data
        .get("course_name")
        .and_then(Value::as_str)
        .unwrap_or("Mastering MCQs");
    let url = data
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or(MCQ_COURSE_URL);
    let mut docs = Vec::new();

    if let Some(info) = data.get("basic_info").and_then(Value::as_object)
        && !info.is_empty()
    {
        let lines: Vec<String> = info
            .iter()
            .filter(|(key, _)| key.as_str() != "course_name")
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{}: {rendered}", title_case(key))
            })
            .collect();
        docs.push(
            Chunk::new(
                format!("Course: {name}\n\n{}", lines.join("\n")),
                "modular_courses",
                "course_basic_info",
                url,
                "sunbeam_mcq_course",
            )
            .with("course_name", name),
        );
    }

    if let Some(sections) = data.get("sections").and_then(Value::as_array) {
        for section in sections {
            let content = section
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            if content.is_empty() {
                continue;
            }
            let title = section.get("title").and_then(Value::as_str).unwrap_or("");
            let heading = format!("{name} - {title}");
            let pieces = chunk_text_if_large(&heading, content);
            let total = pieces.len();
            for (index, piece) in pieces.into_iter().enumerate() {
                let mut doc = Chunk::new(
                    format!("{heading}\n\n{piece}"),
                    "modular_courses",
                    "course_section",
                    url,
                    "sunbeam_mcq_course",
                )
                .with("course_name", name)
                .with("section_title", title);
                if total > 1 {
                    doc = doc
                        .with("chunk_index", index as u64)
                        .with("total_chunks", total as u64);
                }
                docs.push(doc);
            }
        }
    }
    docs
}

/// Contact page: free text plus dedicated email-list and phone-list chunks.
///
/// The dedicated list chunks keep exact contact data close to contact-flavored
/// queries, which the router extracts from with regexes instead of generating.
pub fn chunk_contact(data: &Value) -> Vec<Chunk> {
    let url = data
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or(CONTACT_URL);
    let mut docs = Vec::new();

    if let Some(text) = data.get("full_text").and_then(Value::as_str)
        && !text.is_empty()
    {
        docs.push(Chunk::new(
            format!("Contact Information - Sunbeam Institute\n\n{text}"),
            "contact",
            "main_content",
            url,
            "sunbeam_contact",
        ));
    }
    if let Some(emails) = string_list(data.get("emails"))
        && !emails.is_empty()
    {
        docs.push(Chunk::new(
            format!("Sunbeam Institute Email Addresses:\n\n{}", emails.join("\n")),
            "contact",
            "emails",
            url,
            "sunbeam_contact",
        ));
    }
    if let Some(phones) = string_list(data.get("phones"))
        && !phones.is_empty()
    {
        docs.push(Chunk::new(
            format!("Sunbeam Institute Phone Numbers:\n\n{}", phones.join("\n")),
            "contact",
            "phones",
            url,
            "sunbeam_contact",
        ));
    }
    docs
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then_some(text)
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    Some(
        value?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// `snake_case` key → `Snake Case` label for the basic-info block.
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_detail_skips_placeholder_link() {
        let data = json!([
            {"course_name": "Python Development", "duration": "3 months", "link": "N/A"}
        ]);
        let docs = chunk_modular_courses(&data);
        // Overview chunk plus one detail chunk.
        assert_eq!(docs.len(), 2);

        let detail = &docs[1];
        assert!(detail.content.contains("Course: Python Development"));
        assert!(detail.content.contains("Duration: 3 months"));
        assert!(!detail.content.contains("More Information"));
        assert_eq!(detail.meta_str("course_name"), Some("Python Development"));
        assert_eq!(detail.meta_str("url"), Some(MODULAR_COURSES_URL));
    }

    #[test]
    fn course_detail_keeps_real_link() {
        let data = json!({"courses": [
            {"course_name": "MERN Stack", "duration": "2 months", "link": "https://x.example/mern"}
        ]});
        let docs = chunk_modular_courses(&data);
        let detail = &docs[1];
        assert!(detail.content.contains("More Information: https://x.example/mern"));
        assert_eq!(detail.meta_str("url"), Some("https://x.example/mern"));
    }

    #[test]
    fn internship_programs_render_missing_fields_as_na() {
        let data = json!({
            "programs": [
                {"Technology": "GenAI", "Location": "Pune"}
            ]
        });
        let docs = chunk_internship(&data);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.contains("Technology: GenAI"));
        assert!(docs[0].content.contains("Aim: N/A"));
        assert!(docs[0].content.contains("Prerequisite: N/A"));
        assert_eq!(docs[0].meta_str("section_type"), Some("program"));
        assert_eq!(docs[0].meta_str("technology"), Some("GenAI"));
    }

    #[test]
    fn batch_schedule_collapses_into_one_chunk() {
        let data = json!({
            "batches": [
                {"Batch": "June", "Batch Duration": "8 weeks", "Start Date": "2025-06-01",
                 "End Date": "2025-07-27", "Time": "9am", "Fees (Rs.)": "4000/-"},
                {"Batch": "July"}
            ]
        });
        let docs = chunk_internship(&data);
        assert_eq!(docs.len(), 1);
        let chunk = &docs[0];
        assert!(chunk.content.starts_with("Internship Batches Schedule"));
        assert!(chunk.content.contains("Fees: 4000/-"));
        assert!(chunk.content.contains("Fees: N/A"));
        assert_eq!(chunk.metadata.get("total_batches"), Some(&json!(2)));
    }

    #[test]
    fn contact_topic_emits_dedicated_list_chunks() {
        let data = json!({
            "full_text": "Reach us at the Pune office.",
            "emails": ["info@sunbeaminfo.com"],
            "phones": ["+91 20 1234 5678"]
        });
        let docs = chunk_contact(&data);
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].meta_str("section_type"), Some("emails"));
        assert!(docs[1].content.contains("info@sunbeaminfo.com"));
        assert_eq!(docs[2].meta_str("section_type"), Some("phones"));
    }

    #[test]
    fn mcq_basic_info_titles_keys_and_drops_course_name() {
        let data = json!({
            "course_name": "Mastering MCQs",
            "basic_info": {
                "course_name": "Mastering MCQs",
                "duration": "6 weeks",
                "batch_start": "August"
            }
        });
        let docs = chunk_mcq_course(&data);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.starts_with("Course: Mastering MCQs"));
        assert!(docs[0].content.contains("Duration: 6 weeks"));
        assert!(docs[0].content.contains("Batch Start: August"));
        assert!(!docs[0].content.contains("Course Name:"));
    }

    #[test]
    fn about_us_prefixes_title_line() {
        let data = json!({
            "main_description": "  Training institute in Pune.  ",
            "accordion_sections": [
                {"title": "History", "content": "Founded decades ago."}
            ]
        });
        let docs = chunk_about_us(&data);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].content.starts_with("About Sunbeam Institute\n\n"));
        assert!(docs[0].content.ends_with("Training institute in Pune."));
        assert_eq!(docs[1].meta_str("section_type"), Some("accordion"));
    }
}
