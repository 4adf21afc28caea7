//! Page templates
//!
//! A [`Template`] pairs a placeholder pattern with the SEO field templates and
//! content sections rendered for every combination of its variables.

pub mod validation;
pub mod variables;

pub use validation::{validate_template, ValidationReport};
pub use variables::{extract_variables, is_valid_variable_name};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// Heading and body of a template-declared content section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTemplate {
    pub heading: String,
    pub body: String,
}

/// Named template field, used when reporting problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    Pattern,
    Title,
    MetaDescription,
    Heading,
    UrlPattern,
    SectionHeading(usize),
    SectionBody(usize),
}

impl std::fmt::Display for TemplateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateField::Pattern => write!(f, "pattern"),
            TemplateField::Title => write!(f, "title_template"),
            TemplateField::MetaDescription => write!(f, "meta_description_template"),
            TemplateField::Heading => write!(f, "heading_template"),
            TemplateField::UrlPattern => write!(f, "url_pattern"),
            TemplateField::SectionHeading(i) => write!(f, "content_sections[{i}].heading"),
            TemplateField::SectionBody(i) => write!(f, "content_sections[{i}].body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    pub pattern: String,
    /// Explicit required variables; derived from `pattern` when empty
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    #[serde(default)]
    pub title_template: String,
    #[serde(default)]
    pub meta_description_template: String,
    #[serde(default)]
    pub heading_template: String,
    #[serde(default)]
    pub url_pattern: String,
    #[serde(default)]
    pub content_sections: Vec<SectionTemplate>,
}

impl Template {
    pub fn builder(pattern: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder::new(pattern)
    }

    /// Required variables in declared order
    pub fn required_variables(&self) -> Vec<String> {
        if self.required.is_empty() {
            extract_variables(&self.pattern)
        } else {
            let mut seen = HashSet::new();
            self.required
                .iter()
                .filter(|name| seen.insert(name.as_str()))
                .cloned()
                .collect()
        }
    }

    /// Optional variables that are not also required
    pub fn optional_variables(&self) -> Vec<String> {
        let required: HashSet<String> = self.required_variables().into_iter().collect();
        let mut seen = HashSet::new();
        self.optional
            .iter()
            .filter(|name| !required.contains(*name) && seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Required followed by optional variables
    pub fn declared_variables(&self) -> Vec<String> {
        let mut all = self.required_variables();
        all.extend(self.optional_variables());
        all
    }

    /// Every field with its text, in rendering order
    pub fn fields(&self) -> Vec<(TemplateField, &str)> {
        let mut fields = vec![
            (TemplateField::Pattern, self.pattern.as_str()),
            (TemplateField::Title, self.title_template.as_str()),
            (
                TemplateField::MetaDescription,
                self.meta_description_template.as_str(),
            ),
            (TemplateField::Heading, self.heading_template.as_str()),
            (TemplateField::UrlPattern, self.url_pattern.as_str()),
        ];
        for (i, section) in self.content_sections.iter().enumerate() {
            fields.push((TemplateField::SectionHeading(i), section.heading.as_str()));
            fields.push((TemplateField::SectionBody(i), section.body.as_str()));
        }
        fields
    }

    /// Every placeholder across all fields in first-seen order
    pub fn all_placeholders(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.fields()
            .into_iter()
            .flat_map(|(_, text)| extract_variables(text))
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a template from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(Error::invalid_template(format!(
                "Unsupported template file extension: {:?}",
                other
            ))),
        }
    }
}

/// Chained construction for templates built in code
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    template: Template,
}

impl TemplateBuilder {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            template: Template {
                name: String::new(),
                pattern: pattern.into(),
                required: Vec::new(),
                optional: Vec::new(),
                title_template: String::new(),
                meta_description_template: String::new(),
                heading_template: String::new(),
                url_pattern: String::new(),
                content_sections: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.template.name = name.into();
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn optional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template.optional = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.template.title_template = title.into();
        self
    }

    pub fn meta_description(mut self, meta: impl Into<String>) -> Self {
        self.template.meta_description_template = meta.into();
        self
    }

    pub fn heading(mut self, heading: impl Into<String>) -> Self {
        self.template.heading_template = heading.into();
        self
    }

    pub fn url_pattern(mut self, url: impl Into<String>) -> Self {
        self.template.url_pattern = url.into();
        self
    }

    pub fn section(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.template.content_sections.push(SectionTemplate {
            heading: heading.into(),
            body: body.into(),
        });
        self
    }

    pub fn build(self) -> Template {
        self.template
    }
}
