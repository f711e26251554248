//! Prompt text for the agent and update passes.

use crate::catalog::AttributeSpec;

/// System message for the agent that reads chunks and calls tools.
pub const AGENT_SYSTEM_PROMPT: &str = "You are an agent going through a book series to \
create a comprehensive wiki. Add relevant information from the `Current chunk` to the wiki \
using the functions given to you. Call each function as many times as needed. Call \
`do_nothing` if the current chunk contains only an index or table of contents.";

/// System message for the synthesis model that rewrites attributes.
pub const UPDATE_SYSTEM_PROMPT: &str = "You are an agent creating a comprehensive wiki for a \
book series. Update the existing content with the new information from the buffer according \
to the instructions. Format your output as Markdown when asked to. Your writing style must \
mirror the style of popular fan wikis. If no information is presented to you, output '...'. \
Do not assume missing information; skip it and do not mention it.";

/// Build the per-chunk user prompt from the running summary and the chunk text.
pub fn chunk_prompt<'a>(previous: impl IntoIterator<Item = &'a str>, chunk: &str) -> String {
    let mut prev = String::new();
    for summary in previous {
        prev.push_str("```");
        prev.push_str(summary);
        prev.push_str("```\n\n");
    }
    format!("#Summary of previous chunks:\n\n{prev} #Current chunk:\n\n{chunk}")
}

/// Build the rewrite prompt for one text attribute.
pub fn update_prompt(
    section: &str,
    entity: &str,
    spec: &AttributeSpec,
    existing: &str,
    buffer: &[String],
) -> String {
    let name = spec.name;
    format!(
        "Rewrite the content by combining the new information from the buffer with the \
existing information of the {section}: {entity}'s {name} according to the update \
instructions.\n\n\
Description of {name}: \"\"\"{description}\"\"\"\n\n\
Update Instructions: \"\"\"{instructions}\n\n\"\"\"\
Existing {name} information: \"\"\"{existing}\"\"\"\n\n\
New information from {name} buffer: \"\"\"{new}\"\"\"\n\n",
        description = spec.description,
        instructions = spec.instructions,
        new = buffer.join("\n"),
    )
}
