//! Skill vocabulary matching

use std::collections::HashSet;

/// Matches a fixed, ordered vocabulary of skill phrases against raw resume text.
pub struct SkillMatcher {
    phrases: Vec<Vec<String>>,
}

impl SkillMatcher {
    pub fn new(vocabulary: &[String]) -> Self {
        let phrases = vocabulary
            .iter()
            .map(|phrase| tokenize(phrase).into_iter().map(|t| t.to_lowercase()).collect::<Vec<_>>())
            .filter(|tokens| !tokens.is_empty())
            .collect();

        Self { phrases }
    }

    /// Skills in vocabulary order, each spelled as it first appears in the text.
    pub fn match_skills(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let mut seen = HashSet::new();
        let mut skills = Vec::new();

        for phrase in &self.phrases {
            let Some(start) = find_phrase(&lowered, phrase) else {
                continue;
            };
            let literal = tokens[start..start + phrase.len()].join(" ");
            if seen.insert(literal.to_lowercase()) {
                skills.push(literal);
            }
        }

        skills
    }
}

fn find_phrase(tokens: &[String], phrase: &[String]) -> Option<usize> {
    if phrase.len() > tokens.len() {
        return None;
    }
    tokens.windows(phrase.len()).position(|window| window == phrase)
}

/// Split on whitespace and list punctuation, then strip edge punctuation except the
/// `+` and `#` that end names like C++ and C#.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/' | '|' | '(' | ')' | '[' | ']' | '"'))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#'))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_occurrence_casing_and_no_duplicates() {
        let matcher = SkillMatcher::new(&vocab(&["Python", "SQL"]));
        let skills = matcher.match_skills("Experienced in Python and SQL and python");
        assert_eq!(skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_order_follows_vocabulary_not_document() {
        let matcher = SkillMatcher::new(&vocab(&["Python", "SQL"]));
        let skills = matcher.match_skills("sql first, then PYTHON");
        assert_eq!(skills, vec!["PYTHON", "sql"]);
    }

    #[test]
    fn test_multi_word_phrases_need_contiguous_tokens() {
        let matcher = SkillMatcher::new(&vocab(&["Machine Learning", "Data Analysis"]));
        let skills = matcher.match_skills("machine\nlearning projects; data and analysis");
        assert_eq!(skills, vec!["machine learning"]);
    }

    #[test]
    fn test_whole_token_matching() {
        let matcher = SkillMatcher::new(&vocab(&["Java", "C++", "C#", "Node.js"]));
        let skills = matcher.match_skills("JavaScript, (C++), C#/Node.js.");
        assert_eq!(skills, vec!["C++", "C#", "Node.js"]);
    }

    #[test]
    fn test_no_matches() {
        let matcher = SkillMatcher::new(&vocab(&["Rust"]));
        assert!(matcher.match_skills("").is_empty());
        assert!(matcher.match_skills("gardening").is_empty());
    }
}
