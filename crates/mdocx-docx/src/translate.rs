//! Prose markdown to section translation.
//!
//! A fixed event walk over `pulldown-cmark`, not a general renderer. The
//! translation table is closed: headings, paragraphs, lists, tables, code
//! blocks, and bold/italic/inline-code runs. Everything else flattens to
//! its plain text so no input is ever dropped.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::section::{Section, StyledRun, TableRow};

/// Translate one prose block into document sections.
#[must_use]
pub fn translate_prose(markdown: &str) -> Vec<Section> {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut translator = ProseTranslator::default();
    for event in parser {
        translator.process_event(event);
    }
    translator.finish()
}

#[derive(Default)]
struct TableBuilder {
    header_rows: usize,
    rows: Vec<TableRow>,
    row: TableRow,
    cell: Vec<StyledRun>,
    in_head: bool,
}

#[derive(Default)]
struct ProseTranslator {
    sections: Vec<Section>,
    runs: Vec<StyledRun>,
    bold: usize,
    italic: usize,
    heading: Option<u8>,
    list_stack: Vec<bool>,
    /// Depth of open list items. Paragraph boundaries inside an item are
    /// flattened into the item's runs.
    item_depth: usize,
    code: Option<String>,
    table: Option<TableBuilder>,
}

impl ProseTranslator {
    fn finish(mut self) -> Vec<Section> {
        // Text outside any closed structure still lands in the document.
        self.flush_paragraph();
        self.sections
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_run(StyledRun {
                text: code.to_string(),
                bold: self.bold > 0,
                italic: self.italic > 0,
                code: true,
            }),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            // Outside the translation table.
            Event::Rule
            | Event::TaskListMarker(_)
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.heading = Some(heading_level(*level));
            }
            // The fence language is not carried; all code blocks render
            // the same monospace style.
            Tag::CodeBlock(_) => {
                self.flush_paragraph();
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                if self.item_depth > 0 {
                    // A nested list ends the parent item's own text; emit it
                    // as a list item, not a paragraph.
                    self.emit_list_item();
                } else {
                    self.flush_paragraph();
                }
                self.list_stack.push(start.is_some());
            }
            Tag::Item => {
                self.runs.clear();
                self.item_depth += 1;
            }
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                }
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            // Links and images flatten to their visible text.
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.item_depth == 0 {
                    self.flush_paragraph();
                } else {
                    // Loose list item: keep its paragraphs in one run list.
                    self.push_text(" ");
                }
            }
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(1);
                let runs = std::mem::take(&mut self.runs);
                if !runs.is_empty() {
                    self.sections.push(Section::Heading { level, runs });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(text) = self.code.take() {
                    self.sections.push(Section::CodeBlock {
                        text: text.trim_end_matches('\n').to_owned(),
                    });
                }
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
            }
            TagEnd::Item => {
                self.item_depth = self.item_depth.saturating_sub(1);
                self.emit_list_item();
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.sections.push(Section::Table {
                        header_rows: table.header_rows,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = false;
                    if !table.row.is_empty() {
                        table.rows.push(std::mem::take(&mut table.row));
                        table.header_rows = table.rows.len();
                    }
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    table.rows.push(std::mem::take(&mut table.row));
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table {
                    table.row.push(trim_runs(std::mem::take(&mut table.cell)));
                }
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(buf) = &mut self.code {
            buf.push_str(text);
            return;
        }
        self.push_run(StyledRun {
            text: text.to_owned(),
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: false,
        });
    }

    fn push_run(&mut self, run: StyledRun) {
        if run.text.is_empty() {
            return;
        }
        let sink = match &mut self.table {
            Some(table) => &mut table.cell,
            None => &mut self.runs,
        };
        // Merge runs that carry identical styling.
        if let Some(last) = sink.last_mut()
            && last.bold == run.bold
            && last.italic == run.italic
            && last.code == run.code
        {
            last.text.push_str(&run.text);
        } else {
            sink.push(run);
        }
    }

    /// Emit buffered runs as a list item at the current nesting depth.
    /// Empty after a nested list already consumed the text; skipped then.
    fn emit_list_item(&mut self) {
        let runs = trim_runs(std::mem::take(&mut self.runs));
        if runs.is_empty() {
            return;
        }
        self.sections.push(Section::ListItem {
            ordered: self.list_stack.last().copied().unwrap_or(false),
            depth: self.list_stack.len().saturating_sub(1),
            runs,
        });
    }

    fn flush_paragraph(&mut self) {
        let runs = trim_runs(std::mem::take(&mut self.runs));
        if !runs.is_empty() {
            self.sections.push(Section::Paragraph { runs });
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Strip leading/trailing whitespace at the run-list boundary.
fn trim_runs(mut runs: Vec<StyledRun>) -> Vec<StyledRun> {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_owned();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_owned();
    }
    runs.retain(|r| !r.text.is_empty());
    runs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let sections = translate_prose("# Title\n\nSome text.\n");
        assert_eq!(
            sections,
            vec![
                Section::Heading {
                    level: 1,
                    runs: vec![StyledRun::plain("Title")],
                },
                Section::Paragraph {
                    runs: vec![StyledRun::plain("Some text.")],
                },
            ]
        );
    }

    #[test]
    fn test_inline_styles() {
        let sections = translate_prose("plain **bold** and *italic* and `code`");
        let Section::Paragraph { runs } = &sections[0] else {
            panic!("expected paragraph, got {sections:?}");
        };
        assert_eq!(runs.len(), 6);
        assert_eq!(runs[1].text, "bold");
        assert!(runs[1].bold);
        assert_eq!(runs[3].text, "italic");
        assert!(runs[3].italic);
        assert_eq!(runs[5].text, "code");
        assert!(runs[5].code);
    }

    #[test]
    fn test_nested_styles_combine() {
        let sections = translate_prose("**bold *both***");
        let Section::Paragraph { runs } = &sections[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(runs[0].text, "bold ");
        assert!(runs[0].bold && !runs[0].italic);
        assert_eq!(runs[1].text, "both");
        assert!(runs[1].bold && runs[1].italic);
    }

    #[test]
    fn test_unordered_list() {
        let sections = translate_prose("- one\n- two\n");
        assert_eq!(
            sections,
            vec![
                Section::ListItem {
                    ordered: false,
                    depth: 0,
                    runs: vec![StyledRun::plain("one")],
                },
                Section::ListItem {
                    ordered: false,
                    depth: 0,
                    runs: vec![StyledRun::plain("two")],
                },
            ]
        );
    }

    #[test]
    fn test_ordered_list_nesting() {
        let sections = translate_prose("1. outer\n   1. inner\n");
        assert_eq!(
            sections,
            vec![
                Section::ListItem {
                    ordered: true,
                    depth: 0,
                    runs: vec![StyledRun::plain("outer")],
                },
                Section::ListItem {
                    ordered: true,
                    depth: 1,
                    runs: vec![StyledRun::plain("inner")],
                },
            ]
        );
    }

    #[test]
    fn test_nested_list_keeps_outer_item_text() {
        let sections = translate_prose("- outer\n  - inner one\n  - inner two\n- second\n");
        assert_eq!(
            sections,
            vec![
                Section::ListItem {
                    ordered: false,
                    depth: 0,
                    runs: vec![StyledRun::plain("outer")],
                },
                Section::ListItem {
                    ordered: false,
                    depth: 1,
                    runs: vec![StyledRun::plain("inner one")],
                },
                Section::ListItem {
                    ordered: false,
                    depth: 1,
                    runs: vec![StyledRun::plain("inner two")],
                },
                Section::ListItem {
                    ordered: false,
                    depth: 0,
                    runs: vec![StyledRun::plain("second")],
                },
            ]
        );
    }

    #[test]
    fn test_non_diagram_code_block() {
        let sections = translate_prose("```rust\nfn main() {}\n```\n");
        assert_eq!(
            sections,
            vec![Section::CodeBlock {
                text: "fn main() {}".to_owned(),
            }]
        );
    }

    #[test]
    fn test_table() {
        let sections = translate_prose("| A | B |\n|---|---|\n| 1 | 2 |\n");
        let Section::Table { header_rows, rows } = &sections[0] else {
            panic!("expected table, got {sections:?}");
        };
        assert_eq!(*header_rows, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], vec![StyledRun::plain("A")]);
        assert_eq!(rows[1][1], vec![StyledRun::plain("2")]);
    }

    #[test]
    fn test_link_flattens_to_text() {
        let sections = translate_prose("see [the docs](https://example.com) here");
        let Section::Paragraph { runs } = &sections[0] else {
            panic!("expected paragraph");
        };
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "see the docs here");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(translate_prose(""), Vec::new());
        assert_eq!(translate_prose("   \n\n"), Vec::new());
    }
}
