use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifierError, Result};
use crate::record::PromptContext;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Title,
    Abstract,
}

/// A prompt with `{title}` and `{abstract}` placeholders.
///
/// The template is parsed once up front, so an unknown placeholder or a stray
/// brace fails before the first record is sent. `{{` and `}}` render as
/// literal braces.
///
/// # Example
/// ```
/// use fos_classifier::{PromptTemplate, Record};
///
/// let template: PromptTemplate = "Title: {title}\nAbstract: {abstract}\nAnswer as {{\"label\": ...}}".parse()?;
/// let record = Record::new("r1", "Seed dispersal", "Birds move seeds.");
/// let prompt = template.render(&record.prompt_context()?);
/// assert!(prompt.starts_with("Title: Seed dispersal"));
/// assert!(prompt.ends_with("{\"label\": ...}"));
/// # Ok::<(), fos_classifier::ClassifierError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let segments = Self::parse(&source)?;
        Ok(Self { source, segments })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fills the placeholders from the record's title and abstract
    pub fn render(&self, context: &PromptContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + context.title.len() + context.abstract_text.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Title => out.push_str(context.title),
                Segment::Abstract => out.push_str(context.abstract_text),
            }
        }
        out
    }

    fn parse(source: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(ClassifierError::TemplateError(format!(
                            "Unclosed '{{' at byte {}", pos
                        )));
                    }
                    let placeholder = match name.as_str() {
                        "title" => Segment::Title,
                        "abstract" => Segment::Abstract,
                        other => {
                            return Err(ClassifierError::TemplateError(format!(
                                "Unknown placeholder '{{{}}}', expected {{title}} or {{abstract}}",
                                other
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(placeholder);
                }
                '}' => {
                    return Err(ClassifierError::TemplateError(format!(
                        "Single '}}' at byte {} must be escaped as '}}}}'",
                        pos
                    )))
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }
}

impl FromStr for PromptTemplate {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
