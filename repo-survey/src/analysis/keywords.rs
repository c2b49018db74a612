//! Case-insensitive keyword search over free text.

use lazy_static::lazy_static;
use regex::Regex;

/// An ordered list of keywords with compiled matchers.
///
/// A keyword matches at a leading word boundary, so `test` finds "Testing"
/// but not "attest". Multi-word keywords match their literal spaces.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    entries: Vec<(String, Regex)>,
}

impl KeywordSet {
    /// Compiles a keyword set.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern exceeds the regex size limits.
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = keywords
            .into_iter()
            .map(|keyword| {
                let keyword = keyword.as_ref();
                let pattern = format!(r"(?i)\b{}", regex::escape(keyword));
                Regex::new(&pattern).map(|re| (keyword.to_string(), re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// Keywords found in `text`, in declaration order.
    pub fn find_in(&self, text: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }

    /// Returns true if any keyword occurs in `text`.
    pub fn any_in(&self, text: &str) -> bool {
        self.entries.iter().any(|(_, re)| re.is_match(text))
    }

    /// The keywords of this set.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(keyword, _)| keyword.as_str())
    }
}

lazy_static! {
    /// Installation instructions.
    pub static ref INSTALLATION: KeywordSet =
        KeywordSet::new(["quick start guide", "getting started", "installation"])
            .expect("INSTALLATION keywords are valid");

    /// Usage documentation.
    pub static ref USAGE: KeywordSet = KeywordSet::new(["usage", "examples", "tutorial"])
        .expect("USAGE keywords are valid");

    /// Reproducibility signals.
    pub static ref REPRODUCIBILITY: KeywordSet = KeywordSet::new([
        "installation",
        "setup",
        "usage",
        "docker",
        "containerisation",
        "versioning",
        "data",
    ])
    .expect("REPRODUCIBILITY keywords are valid");

    /// Security signals.
    pub static ref SECURITY: KeywordSet = KeywordSet::new([
        "security",
        "authentication",
        "encryption",
        "access control",
        "audit",
        "logging",
        "updates",
        "patches",
        "penetration testing",
        "vulnerability testing",
    ])
    .expect("SECURITY keywords are valid");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_at_leading_word_boundary() {
        let set = KeywordSet::new(["test"]).unwrap();
        assert!(set.any_in("Testing instructions"));
        assert!(set.any_in("run the test suite"));
        assert!(!set.any_in("we attest to this"));
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(INSTALLATION.find_in("## Getting Started"), vec!["getting started"]);
        assert_eq!(USAGE.find_in("See EXAMPLES and the Tutorial"), vec!["examples", "tutorial"]);
    }

    #[test]
    fn multi_word_keywords_need_their_spaces() {
        assert!(SECURITY.any_in("Role based Access Control is supported"));
        assert!(!SECURITY.any_in("accesscontrol"));
    }

    #[test]
    fn escapes_regex_metacharacters() {
        let set = KeywordSet::new(["c++"]).unwrap();
        assert!(set.any_in("Written in C++17"));
        assert!(!set.any_in("Written in C"));
    }

    #[test]
    fn reproducibility_detects_docker() {
        assert!(REPRODUCIBILITY.any_in("Run it with Docker compose"));
        assert!(!REPRODUCIBILITY.any_in("A plain description"));
    }
}
