//! Simple selectors for mount-target lookup.
//!
//! Supported forms: `tag`, `#id`, `.class` and compounds such as
//! `div#app.main`. Combinators are not supported.

use crate::error::{Result, WorkframeError};

/// A parsed compound selector. Every present part must match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

#[derive(Clone, Copy)]
enum Part {
    Tag,
    Id,
    Class,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = || WorkframeError::InvalidArgument(format!("unsupported selector: {input:?}"));

        if input.is_empty() || input.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let mut selector = Selector::default();
        let mut part = Part::Tag;
        let mut current = String::new();

        let flush = |part: Part, current: &mut String, selector: &mut Selector| -> Result<()> {
            let value = std::mem::take(current);
            match part {
                Part::Tag if value.is_empty() => {}
                Part::Tag => selector.tag = Some(value.to_lowercase()),
                _ if value.is_empty() => return Err(invalid()),
                Part::Id => selector.id = Some(value),
                Part::Class => selector.classes.push(value),
            }
            Ok(())
        };

        for ch in input.chars() {
            match ch {
                '#' => {
                    flush(part, &mut current, &mut selector)?;
                    part = Part::Id;
                }
                '.' => {
                    flush(part, &mut current, &mut selector)?;
                    part = Part::Class;
                }
                c if c.is_alphanumeric() || c == '-' || c == '_' => current.push(c),
                _ => return Err(invalid()),
            }
        }
        flush(part, &mut current, &mut selector)?;

        Ok(selector)
    }

    /// Test an element described by its tag and attributes.
    pub fn matches(&self, tag: &str, attributes: &[(String, String)]) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        let attribute = |name: &str| {
            attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if let Some(id) = &self.id {
            if attribute("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_list: Vec<&str> = attribute("class")
                .map(|c| c.split_whitespace().collect())
                .unwrap_or_default();
            if !self.classes.iter().all(|c| class_list.contains(&c.as_str())) {
                return false;
            }
        }

        true
    }
}
