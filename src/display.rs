//! Text rendering of a sentence with its mentions underlined.

use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::{Mention, Sentence, Spannable};

/// Internal representation of an included mention for display.
struct IncludedMention {
    /// Display columns `[start, end)`
    columns: (usize, usize),
    label: String,
}

/// Renders a sentence with its mentions underlined.
///
/// ```text
/// no evidence of effusion but edema noted
/// ╰╯no
///                ╰──────╯effusion(Negative_Polarity)
/// ```
pub struct SentenceDisplay<'a> {
    sentence: &'a Sentence,
    show_modifiers: bool,
    include: Vec<&'a Mention>,
}

impl<'a> std::fmt::Display for SentenceDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sentence.text)?;

        for included in self.included() {
            f.write_char('\n')?;

            let (start_col, end_col) = included.columns;
            for _ in 0..start_col {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;
            for _ in (start_col + 1)..end_col.saturating_sub(1) {
                f.write_char('─')?;
            }
            if end_col - start_col > 1 {
                f.write_char('╯')?;
            }

            f.write_str(&included.label)?;
        }

        Ok(())
    }
}

impl<'a> SentenceDisplay<'a> {
    pub fn new(sentence: &'a Sentence) -> Self {
        SentenceDisplay {
            sentence,
            show_modifiers: false,
            include: Vec::new(),
        }
    }

    /// Include every mention of the sentence.
    pub fn include_mentions(&mut self) {
        self.include_where(|_| true);
    }

    /// Include the mentions matching `keep`.
    pub fn include_where(&mut self, keep: impl Fn(&Mention) -> bool) {
        let sentence = self.sentence;
        self.include
            .extend(sentence.mentions.iter().filter(|m| keep(*m)));
    }

    /// Append non-default modifier values to each label.
    pub fn show_modifiers(&mut self) {
        self.show_modifiers = true;
    }

    /// Takes self
    pub fn with_mentions(mut self) -> Self {
        self.include_mentions();
        self
    }

    /// Takes self
    pub fn with_modifiers(mut self) -> Self {
        self.show_modifiers();
        self
    }

    fn column(&self, offset: usize) -> usize {
        let rel = offset.saturating_sub(self.sentence.offset);
        self.sentence
            .text
            .get(..rel)
            .map_or(rel, UnicodeWidthStr::width)
    }

    fn included(&self) -> Vec<IncludedMention> {
        self.include
            .iter()
            .map(|mention| {
                let mut label = mention.code().to_string();
                if self.show_modifiers {
                    let values: Vec<&str> =
                        mention.asserted_modifiers().map(|m| m.value.as_str()).collect();
                    if !values.is_empty() {
                        label.push_str(&format!("({})", values.join(", ")));
                    }
                }
                IncludedMention {
                    columns: (self.column(mention.start()), self.column(mention.end())),
                    label,
                }
            })
            .collect()
    }
}
