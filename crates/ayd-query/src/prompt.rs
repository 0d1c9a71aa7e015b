//! Prompt assembly.

use ayd_llm::Prompt;

use crate::RetrievedChunk;

/// Instructions sent with every question.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about the \
user's documents. Answer using only the information in the provided context. Cite the sources \
you rely on with their bracketed numbers, for example [1] or [2]. If the context does not \
contain the answer, say that you could not find it in the documents. Do not make up facts.";

/// Joins chunks into a numbered context block of at most `max_chars` characters.
///
/// Each chunk is headed `[n] file_name`. The first chunk is always included,
/// cut to fit if needed; later chunks that would overflow are dropped.
/// Returns the context and the number of chunks it holds.
pub fn build_context(chunks: &[RetrievedChunk], max_chars: usize) -> (String, usize) {
    let mut context = String::new();
    let mut used = 0;
    let mut included = 0;

    for (i, chunk) in chunks.iter().enumerate() {
        let section = format!("[{}] {}\n{}\n\n", i + 1, chunk.file_name, chunk.text.trim());
        let len = section.chars().count();
        if used + len > max_chars {
            if included == 0 {
                context.extend(section.chars().take(max_chars));
                included = 1;
            }
            break;
        }
        context.push_str(&section);
        used += len;
        included += 1;
    }

    (context.trim_end().to_string(), included)
}

/// Builds the prompt for `question` over an already assembled context.
pub fn build_prompt(context: &str, question: &str) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"),
    }
}
