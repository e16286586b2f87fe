//! Section splitting for resume and job-description text.
//!
//! Raw document text is cleaned and partitioned into labeled sections
//! (summary, skills, experience, projects, education, requirements, and so
//! on) that become chunk metadata and drive section-filtered retrieval.
//!
//! Short heading lines switch the active section; everything else is body
//! text for the current section. Line-shape heuristics (project pipes,
//! achievement keywords) only classify text that no heading has claimed,
//! so an explicit heading always owns its region.

/// Section label applied when no heading matches.
pub const DEFAULT_SECTION: &str = "other";

/// A heading line has at most this many words once normalized.
const MAX_HEADING_WORDS: usize = 4;

/// Heading keywords mapped to canonical section names.
const SECTION_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "summary",
        &["summary", "professional summary", "profile", "objective"],
    ),
    ("skills", &["skills", "technical skills", "key skills"]),
    ("experience", &["experience", "work experience", "employment"]),
    ("projects", &["projects", "project"]),
    ("education", &["education", "academic background"]),
    ("requirements", &["requirements", "qualifications"]),
    ("responsibilities", &["responsibilities", "duties"]),
    ("achievements", &["achievements", "awards", "certifications"]),
];

const ACHIEVEMENT_KEYWORDS: &[&str] = &[
    "award",
    "achievement",
    "certificate",
    "certification",
    "certified",
    "honored",
    "recognition",
    "prize",
];

const EXPERIENCE_KEYWORDS: &[&str] = &[
    "work experience",
    "employment",
    "internship",
    "worked at",
    "responsibilities",
];

/// Normalize whitespace and strip bullet artifacts left by text extraction.
pub fn basic_clean(text: &str) -> String {
    let text = text.replace('\t', " ").replace('\u{2022}', " ");
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Lower-case a heading candidate and drop everything but letters and spaces.
fn normalize_heading(line: &str) -> String {
    line.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() || c == ' ' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical section for a heading-shaped line, if any.
fn heading_section(line: &str) -> Option<&'static str> {
    let norm = normalize_heading(line);
    if norm.is_empty() || norm.split(' ').count() > MAX_HEADING_WORDS {
        return None;
    }
    for (section, keywords) in SECTION_KEYWORDS {
        if keywords.iter().any(|k| norm.contains(k)) {
            return Some(section);
        }
    }
    None
}

/// Project entries usually read "Name | Tech Stack | ...".
fn looks_like_project(line: &str) -> bool {
    match line.split_once('|') {
        Some((name, _)) => name.trim().len() > 3,
        None => false,
    }
}

fn is_experience_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    EXPERIENCE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_achievement_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    ACHIEVEMENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Split cleaned document text into `(section, body)` blocks.
///
/// Sections appear in first-encounter order. Heading lines switch the active
/// section and are not kept as body text. Lines arriving before any heading
/// are classified by shape (project / experience / achievement) or fall into
/// [`DEFAULT_SECTION`]. Sections that end up with no body are dropped.
pub fn split_into_sections(raw_text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut current = DEFAULT_SECTION;

    fn bucket<'a, 'b>(
        sections: &'b mut Vec<(String, Vec<&'a str>)>,
        name: &str,
    ) -> &'b mut Vec<&'a str> {
        if let Some(pos) = sections.iter().position(|(s, _)| s == name) {
            return &mut sections[pos].1;
        }
        sections.push((name.to_string(), Vec::new()));
        &mut sections.last_mut().unwrap().1
    }

    for line in raw_text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        if let Some(section) = heading_section(stripped) {
            current = section;
            bucket(&mut sections, section);
            continue;
        }

        // Shape heuristics only apply to text no heading has claimed.
        if current == DEFAULT_SECTION {
            if looks_like_project(stripped) {
                current = "projects";
            } else if is_achievement_line(stripped) {
                current = "achievements";
            } else if is_experience_line(stripped) {
                current = "experience";
            }
        }

        bucket(&mut sections, current).push(stripped);
    }

    sections
        .into_iter()
        .map(|(section, lines)| (section, lines.join("\n").trim().to_string()))
        .filter(|(_, body)| !body.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_clean_normalizes_whitespace() {
        let cleaned = basic_clean("  hello\t world \n\u{2022} item   one \n");
        assert_eq!(cleaned, "hello world\nitem one");
    }

    #[test]
    fn test_heading_detection() {
        assert_eq!(heading_section("TECHNICAL SKILLS:"), Some("skills"));
        assert_eq!(heading_section("Professional Summary"), Some("summary"));
        assert_eq!(heading_section("EDUCATION"), Some("education"));
        assert_eq!(heading_section("Key Responsibilities"), Some("responsibilities"));
        assert_eq!(heading_section("REQUIREMENTS"), Some("requirements"));
        assert_eq!(heading_section("WORK EXPERIENCE"), Some("experience"));
    }

    #[test]
    fn test_long_lines_are_not_headings() {
        assert_eq!(
            heading_section("five years of experience with distributed systems"),
            None
        );
        assert_eq!(heading_section("random sentence here"), None);
    }

    #[test]
    fn test_project_line_shape() {
        assert!(looks_like_project("Chatbot Platform | Python, FastAPI"));
        assert!(!looks_like_project("ab | too short a name"));
        assert!(!looks_like_project("no pipe at all"));
    }

    #[test]
    fn test_split_routes_lines_to_sections() {
        let text = "John Smith\nSKILLS\nPython, Rust, Docker\nEDUCATION\nBS Computer Science";
        let sections = split_into_sections(text);

        let get = |name: &str| {
            sections
                .iter()
                .find(|(s, _)| s == name)
                .map(|(_, b)| b.clone())
        };

        assert_eq!(get("other").as_deref(), Some("John Smith"));
        assert_eq!(get("skills").as_deref(), Some("Python, Rust, Docker"));
        assert_eq!(get("education").as_deref(), Some("BS Computer Science"));
    }

    #[test]
    fn test_heading_owns_following_body_lines() {
        let text = "REQUIREMENTS\nExperience with Rust and distributed systems\nStrong SQL";
        let sections = split_into_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, "requirements");
        assert!(sections[0].1.contains("Rust"));
        assert!(sections[0].1.contains("Strong SQL"));
    }

    #[test]
    fn test_experience_heading_keeps_body() {
        let text = "WORK EXPERIENCE\nBuilt APIs at Acme Corp\nLed migration to Kubernetes";
        let sections = split_into_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, "experience");
        assert!(sections[0].1.contains("Acme"));
    }

    #[test]
    fn test_split_preserves_first_encounter_order() {
        let text = "SKILLS\nRust\nSUMMARY\nEngineer";
        let sections = split_into_sections(text);
        let names: Vec<&str> = sections.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["skills", "summary"]);
    }

    #[test]
    fn test_unheaded_achievement_lines_classified_by_shape() {
        let text = "Won first prize at the regional hackathon\nAWS certified developer";
        let sections = split_into_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, "achievements");
        assert!(sections[0].1.contains("prize"));
        assert!(sections[0].1.contains("certified"));
    }

    #[test]
    fn test_unheaded_project_line_classified_by_shape() {
        let text = "Search Engine | Rust, Tantivy\nHybrid retrieval over local documents";
        let sections = split_into_sections(text);
        assert_eq!(sections[0].0, "projects");
        assert!(sections[0].1.contains("Tantivy"));
        // The follow-on description stays with the project it belongs to.
        assert!(sections[0].1.contains("retrieval"));
    }

    #[test]
    fn test_empty_input() {
        assert!(split_into_sections("").is_empty());
    }

    #[test]
    fn test_heading_only_sections_are_dropped() {
        let sections = split_into_sections("SKILLS\nEDUCATION\nBS Mathematics");
        let names: Vec<&str> = sections.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["education"]);
    }
}
