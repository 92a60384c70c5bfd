//! Document structure as delivered by the segmenter: sections, paragraphs and
//! sentences carrying their matched mentions.

use serde::{Deserialize, Serialize};

use crate::{Mention, Span, Spannable};

/// Sentence-type tag from the structurer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SentenceKind {
    #[default]
    Prose,
    Line,
    Worksheet,
    Header,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Position within the document
    pub index: usize,
    /// Document offset of the first character of `text`
    pub offset: usize,
    pub text: String,
    pub kind: SentenceKind,
    pub paragraph: Option<usize>,
    pub section: Option<usize>,
    /// Mentions in document order
    pub mentions: Vec<Mention>,
}

impl Sentence {
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            index: 0,
            offset,
            text: text.into(),
            kind: SentenceKind::Prose,
            paragraph: None,
            section: None,
            mentions: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: SentenceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_paragraph(mut self, paragraph: usize) -> Self {
        self.paragraph = Some(paragraph);
        self
    }

    pub fn with_section(mut self, section: usize) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_mentions(mut self, mentions: impl IntoIterator<Item = Mention>) -> Self {
        self.set_mentions(mentions);
        self
    }

    /// Replace the mention list, ordering it by position.
    ///
    /// Mentions with identical spans keep their input order.
    pub fn set_mentions(&mut self, mentions: impl IntoIterator<Item = Mention>) {
        let index = self.index;
        self.mentions = mentions
            .into_iter()
            .map(|m| m.with_sentence(index))
            .collect();
        self.mentions.sort_by(|a, b| a.compare_span(b));
    }

    /// Text of a document span that lies in this sentence.
    pub fn slice(&self, span: Span) -> Option<&str> {
        span.slice(&self.text, self.offset)
    }

    pub fn mention_text(&self, mention: &Mention) -> String {
        mention.text(&self.text, self.offset)
    }
}

impl Spannable for Sentence {
    fn start(&self) -> usize {
        self.offset
    }

    fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub span: Span,
    pub title: Option<String>,
}

impl Spannable for Paragraph {
    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

impl Spannable for Section {
    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub sentences: Vec<Sentence>,
    pub paragraphs: Vec<Paragraph>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a section and return its index.
    pub fn add_section(&mut self, span: Span, title: Option<&str>) -> usize {
        self.sections.push(Section {
            span,
            title: title.map(str::to_string),
        });
        self.sections.len() - 1
    }

    /// Add a paragraph and return its index.
    pub fn add_paragraph(&mut self, span: Span) -> usize {
        self.paragraphs.push(Paragraph { span });
        self.paragraphs.len() - 1
    }

    /// Append a sentence, renumbering it and its mentions.
    pub fn push_sentence(&mut self, mut sentence: Sentence) -> usize {
        let index = self.sentences.len();
        sentence.index = index;
        for mention in sentence.mentions.iter_mut() {
            mention.sentence = Some(index);
        }
        self.sentences.push(sentence);
        index
    }

    /// Every mention of every sentence, in document order.
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.sentences.iter().flat_map(|s| s.mentions.iter())
    }

    fn sentence_of(&self, mention: &Mention) -> Option<&Sentence> {
        mention.sentence.and_then(|i| self.sentences.get(i))
    }

    /// Section enclosing a mention: its sentence's section, else the first one that contains it.
    pub fn section_of(&self, mention: &Mention) -> Option<&Section> {
        self.sentence_of(mention)
            .and_then(|s| s.section)
            .and_then(|i| self.sections.get(i))
            .or_else(|| self.sections.iter().find(|s| s.contains(mention)))
    }

    /// Paragraph enclosing a mention, if the structurer produced one.
    pub fn paragraph_of(&self, mention: &Mention) -> Option<&Paragraph> {
        self.sentence_of(mention)
            .and_then(|s| s.paragraph)
            .and_then(|i| self.paragraphs.get(i))
            .or_else(|| self.paragraphs.iter().find(|p| p.contains(mention)))
    }
}
