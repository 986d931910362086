/*!
 * Prompt engineering for subtitle translation.
 *
 * This module provides:
 * - Named system prompt templates (styles) with few-shot examples
 * - A registry for looking templates up by style name
 * - A builder turning a chunk of cues into a completion request
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptBuilder, PromptTemplate, TemplateRegistry};
