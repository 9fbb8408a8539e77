//! Prompt Builder
//!
//! Standardized prompt construction for analysis calls.
//!
//! ## Design Principles
//!
//! 1. **Role Definition**: Clear AI role for each task
//! 2. **Structured Objectives**: Numbered goals
//! 3. **Focus Enforcement**: Prevent topic drift
//! 4. **Source Material**: Delimited input content

use crate::ai::schema::SchemaDescriptor;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.into_iter().map(String::from).collect(),
        ));
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Preset prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Prompt for one analysis kind over `content`
    pub fn analysis(descriptor: &SchemaDescriptor, content: &str) -> PromptBuilder {
        PromptBuilder::new()
            .role("content strategist", "creator-facing media analysis")
            .objectives(vec![
                descriptor.description,
                "Fill every required field",
                "Ground every statement in the source material",
            ])
            .focus(
                descriptor.analysis_kind,
                vec![
                    "Do NOT invent facts that are not in the source",
                    "Do NOT wrap the JSON in markdown fences or add commentary",
                ],
            )
            .section("Source Material", content)
    }
}
