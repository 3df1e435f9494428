//! Line-by-line Markdown segmentation.

use crate::block::{Block, BlockKind, DiagramSyntax};

/// Fence tag that opens a diagram block. Any other tag stays prose.
const DIAGRAM_TAG: &str = "mermaid";

/// Split raw Markdown into an ordered sequence of blocks.
///
/// A fenced code block whose opening tag is `mermaid` becomes a diagram
/// block accumulating its source verbatim until the closing fence. All
/// other content, fenced code with other tags included, accumulates into
/// the current prose block. Consecutive prose lines merge into a single
/// block; a diagram block always terminates the preceding prose block.
///
/// A diagram fence left open at end of input yields a diagram block with
/// `terminated: false` so the user's diagram content is never lost.
/// Ordinals are assigned in append order starting at zero.
#[must_use]
pub fn segment(raw_markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = raw_markdown.lines().collect();
    let mut blocks: Vec<Block> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if extract_diagram_fence(lines[i]).is_some() {
            flush_prose(&mut blocks, &mut prose);
            i += 1;

            let mut source_lines: Vec<&str> = Vec::new();
            let mut terminated = false;
            while i < lines.len() {
                if is_closing_fence(lines[i]) {
                    terminated = true;
                    i += 1;
                    break;
                }
                source_lines.push(lines[i]);
                i += 1;
            }

            let source = source_lines.join("\n");
            blocks.push(Block {
                ordinal: blocks.len(),
                kind: BlockKind::Diagram {
                    syntax: DiagramSyntax::classify(&source),
                    source,
                    terminated,
                },
            });
        } else {
            prose.push(lines[i]);
            i += 1;
        }
    }

    flush_prose(&mut blocks, &mut prose);
    blocks
}

/// Append accumulated prose lines as one block, if any.
fn flush_prose(blocks: &mut Vec<Block>, prose: &mut Vec<&str>) {
    if prose.is_empty() {
        return;
    }
    let text = prose.join("\n");
    prose.clear();
    blocks.push(Block {
        ordinal: blocks.len(),
        kind: BlockKind::Prose { text },
    });
}

/// Return the fence tag if this line opens a diagram fence.
fn extract_diagram_fence(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("```")?;
    let tag = rest.trim();
    (tag == DIAGRAM_TAG).then_some(tag)
}

/// A closing fence is a bare ``` line (trailing whitespace tolerated).
fn is_closing_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("```") && trimmed.trim_start_matches('`').trim().is_empty()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn diagram(block: &Block) -> (&str, DiagramSyntax, bool) {
        match &block.kind {
            BlockKind::Diagram {
                source,
                syntax,
                terminated,
            } => (source.as_str(), *syntax, *terminated),
            BlockKind::Prose { .. } => panic!("expected diagram block, got {block:?}"),
        }
    }

    fn prose(block: &Block) -> &str {
        match &block.kind {
            BlockKind::Prose { text } => text.as_str(),
            BlockKind::Diagram { .. } => panic!("expected prose block, got {block:?}"),
        }
    }

    #[test]
    fn test_prose_only() {
        let blocks = segment("# Title\n\nSome text.\n");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(prose(&blocks[0]), "# Title\n\nSome text.");
    }

    #[test]
    fn test_single_diagram_between_prose() {
        let input = "Intro.\n\n```mermaid\nflowchart TD\n  A --> B\n```\n\nOutro.\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 3);
        assert_eq!(prose(&blocks[0]), "Intro.\n");
        let (source, syntax, terminated) = diagram(&blocks[1]);
        assert_eq!(source, "flowchart TD\n  A --> B");
        assert_eq!(syntax, DiagramSyntax::Flowchart);
        assert!(terminated);
        assert_eq!(prose(&blocks[2]), "\nOutro.");
    }

    #[test]
    fn test_ordinals_strictly_increase() {
        let input = "a\n```mermaid\npie\n```\nb\n```mermaid\ngantt\n```\nc\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 5);
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.ordinal, i);
        }
        assert!(blocks[1].is_diagram());
        assert!(blocks[3].is_diagram());
    }

    #[test]
    fn test_non_diagram_fence_stays_prose() {
        let input = "```rust\nfn main() {}\n```\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 1);
        assert_eq!(prose(&blocks[0]), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_unterminated_fence_becomes_diagram_block() {
        let input = "text\n```mermaid\nflowchart TD\n  A --> B\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 2);
        let (source, _, terminated) = diagram(&blocks[1]);
        assert_eq!(source, "flowchart TD\n  A --> B");
        assert!(!terminated);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(segment(""), Vec::new());
    }

    #[test]
    fn test_empty_diagram_body() {
        let blocks = segment("```mermaid\n```\n");

        assert_eq!(blocks.len(), 1);
        let (source, syntax, terminated) = diagram(&blocks[0]);
        assert_eq!(source, "");
        assert_eq!(syntax, DiagramSyntax::Other);
        assert!(terminated);
    }

    #[test]
    fn test_adjacent_diagrams_no_prose_between() {
        let input = "```mermaid\npie\n```\n```mermaid\ngantt\n```\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_diagram());
        assert!(blocks[1].is_diagram());
        assert_eq!(blocks[0].ordinal, 0);
        assert_eq!(blocks[1].ordinal, 1);
    }

    #[test]
    fn test_indented_fence_recognized() {
        let input = "  ```mermaid\n  pie\n  ```\n";
        let blocks = segment(input);

        assert_eq!(blocks.len(), 1);
        let (source, _, terminated) = diagram(&blocks[0]);
        assert_eq!(source, "  pie");
        assert!(terminated);
    }

    #[test]
    fn test_prose_reconstruction_order_preserving() {
        let input = "one\n```mermaid\npie\n```\ntwo\nthree\n```mermaid\ngantt\n```\nfour\n";
        let blocks = segment(input);

        let mut rebuilt: Vec<String> = Vec::new();
        for block in &blocks {
            match &block.kind {
                BlockKind::Prose { text } => rebuilt.push(text.clone()),
                BlockKind::Diagram { .. } => {
                    rebuilt.push(format!("[diagram {}]", block.ordinal));
                }
            }
        }
        assert_eq!(
            rebuilt.join("\n"),
            "one\n[diagram 1]\ntwo\nthree\n[diagram 3]\nfour"
        );
    }
}
