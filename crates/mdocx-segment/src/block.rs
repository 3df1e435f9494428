//! Block types produced by segmentation.

/// Mermaid diagram syntax, classified from the first meaningful source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramSyntax {
    Flowchart,
    Sequence,
    Class,
    State,
    Er,
    Journey,
    Gantt,
    Pie,
    /// Source whose leading keyword is not recognized. Still sent to the
    /// renderer, which is the authority on what it accepts.
    Other,
}

impl DiagramSyntax {
    /// Classify diagram syntax from Mermaid source.
    ///
    /// Looks at the first line that is neither blank nor a `%%` comment.
    #[must_use]
    pub fn classify(source: &str) -> Self {
        let Some(first) = source
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with("%%"))
        else {
            return Self::Other;
        };

        let keyword = first.split_whitespace().next().unwrap_or("");
        match keyword {
            "flowchart" | "graph" => Self::Flowchart,
            "sequenceDiagram" => Self::Sequence,
            "classDiagram" => Self::Class,
            "stateDiagram" | "stateDiagram-v2" => Self::State,
            "erDiagram" => Self::Er,
            "journey" => Self::Journey,
            "gantt" => Self::Gantt,
            "pie" => Self::Pie,
            _ => Self::Other,
        }
    }

    /// Human-readable name used in logs and placeholders.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
            Self::Er => "er",
            Self::Journey => "journey",
            Self::Gantt => "gantt",
            Self::Pie => "pie",
            Self::Other => "other",
        }
    }
}

/// Content of a single segmented block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// A run of consecutive non-diagram lines, fences included verbatim.
    Prose { text: String },
    /// A fenced Mermaid code block.
    Diagram {
        syntax: DiagramSyntax,
        /// Source between the fences, without the fence lines.
        source: String,
        /// False when the closing fence was missing at end of input.
        /// Unterminated blocks fail with a decode error instead of being
        /// silently merged into prose.
        terminated: bool,
    },
}

/// One block of the segmented document.
///
/// The ordinal fixes the block's position in the final document and is
/// preserved through rendering and assembly. Blocks are immutable once
/// segmented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub ordinal: usize,
    pub kind: BlockKind,
}

impl Block {
    /// Whether this block is a diagram block.
    #[must_use]
    pub fn is_diagram(&self) -> bool {
        matches!(self.kind, BlockKind::Diagram { .. })
    }

    /// Diagram source, if this is a diagram block.
    #[must_use]
    pub fn diagram_source(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Diagram { source, .. } => Some(source),
            BlockKind::Prose { .. } => None,
        }
    }
}
