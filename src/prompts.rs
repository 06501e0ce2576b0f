//! Prompts for multimodal PDF-page transcription.
//!
//! Centralising the prompt text here keeps it a single source of truth and
//! lets unit tests inspect it without touching the network. The client sends
//! [`SYSTEM_PROMPT`] as the system message and [`USER_INSTRUCTION`] as the
//! text part of the user message that carries the page image.

/// System message establishing the assistant's role.
pub const SYSTEM_PROMPT: &str = "You are a system that expertly extracts the contents \
of documents into textual representations as Markdown.";

/// Fixed instruction sent alongside every page image.
///
/// Enumerates the required fidelity — structure, markup, math, code — and
/// explicitly forbids wrapping the whole page in an outer fenced block,
/// which vision models otherwise love to do.
pub const USER_INSTRUCTION: &str = "Convert the following image of a page from a PDF \
document to Markdown.  \
Include all headings, paragraphs, lists, tables, etc.  \
Ensure markup is included as necessary such as bold, italics, super- or sub-scripts, etc.  \
Include additional notation as necessary such as mathematical notation in LaTeX math mode, \
code in pre-formatted blocks, etc.  \
The output should be Markdown itself (don't preformat the output in a markdown block), \
and exclude local or hyperlinked images.  \
I.e., don't include a block like ```markdown ...``` wrapping the entire page \
(unless the entire page's content is actually Markdown source).  ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_instruction_forbids_outer_fence() {
        assert!(USER_INSTRUCTION.contains("don't preformat"));
        assert!(USER_INSTRUCTION.contains("```markdown"));
    }

    #[test]
    fn system_prompt_names_markdown() {
        assert!(SYSTEM_PROMPT.contains("Markdown"));
    }
}
