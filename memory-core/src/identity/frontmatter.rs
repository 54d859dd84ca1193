//! A tiny, explicit frontmatter grammar: a `---`-delimited `key: value`
//! block followed by a free-form body (spec §9 design note). Tolerant of
//! unknown keys; never refuses to parse.

use std::collections::BTreeMap;

const SENTINEL: &str = "---";

/// A document split into its structured frontmatter and free-form body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontmatterDocument {
    /// Parsed `key: value` pairs, insertion order not preserved.
    pub frontmatter: BTreeMap<String, String>,
    /// Everything after the closing sentinel, verbatim.
    pub body: String,
}

impl FrontmatterDocument {
    /// Parse `content`. A document with no leading sentinel is treated as
    /// pure body with empty frontmatter — this never fails.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut lines = content.lines();
        let Some(first) = lines.next() else {
            return Self::default();
        };
        if first.trim() != SENTINEL {
            return Self {
                frontmatter: BTreeMap::new(),
                body: content.to_string(),
            };
        }

        let mut frontmatter = BTreeMap::new();
        let mut body_lines = Vec::new();
        let mut in_frontmatter = true;
        for line in lines {
            if in_frontmatter {
                if line.trim() == SENTINEL {
                    in_frontmatter = false;
                    continue;
                }
                if let Some((key, value)) = line.split_once(':') {
                    frontmatter.insert(key.trim().to_string(), value.trim().to_string());
                }
            } else {
                body_lines.push(line);
            }
        }

        Self {
            frontmatter,
            body: body_lines.join("\n"),
        }
    }

    /// Render back to the sentinel-delimited text form. Frontmatter keys are
    /// rendered in sorted order for determinism.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(SENTINEL);
        out.push('\n');
        for (key, value) in &self.frontmatter {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str(SENTINEL);
        out.push('\n');
        out.push_str(&self.body);
        out
    }

    /// Get a frontmatter value as a parsed integer, if present and valid.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.frontmatter.get(key)?.parse().ok()
    }

    /// Get a frontmatter value as a parsed float, if present and valid.
    #[must_use]
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.frontmatter.get(key)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_render_and_parse() {
        let mut frontmatter = BTreeMap::new();
        frontmatter.insert("awakening_count".to_string(), "3".to_string());
        let doc = FrontmatterDocument {
            frontmatter,
            body: "free form body\nwith lines".to_string(),
        };
        let rendered = doc.render();
        let parsed = FrontmatterDocument::parse(&rendered);
        assert_eq!(parsed, doc);
    }

    #[test]
    fn tolerates_unknown_keys() {
        let content = "---\nawakening_count: 1\nmystery_field: xyz\n---\nbody text";
        let doc = FrontmatterDocument::parse(content);
        assert_eq!(doc.get_u64("awakening_count"), Some(1));
        assert_eq!(doc.frontmatter.get("mystery_field"), Some(&"xyz".to_string()));
    }

    #[test]
    fn no_sentinel_is_treated_as_pure_body() {
        let doc = FrontmatterDocument::parse("just some text");
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.body, "just some text");
    }
}
