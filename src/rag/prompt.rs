//! Prompt assembly for retrieval-augmented answers.

use super::store::Passage;

/// Instruction prompt used until a session supplies its own.
pub const DEFAULT_PROMPT: &str = "You are a helpful assistant that answers questions about the content of documents and provides detailed expert advice. \n    You must provide your answer in the Danish language.\n    If the answer contains multiple steps or points, provide the answer in a bullet format. Below the answer ,y ou should add the source of the information (file name and page number) formatted as in the following example.\n    Kilde: filnavn.pdf, side 2\n    ";

/// Fixed tail appended after the instruction prompt; holds the placeholders.
pub const END_OF_PROMPT: &str = "\n    ---------------------\n    {context}\n    ---------------------\n    Given the context information and not prior knowledge, answer the query.\n    Query: {query}\n    Answer: \n";

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUERY_PLACEHOLDER: &str = "{query}";

/// Cited passages joined by blank lines, in retrieval order.
pub fn build_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(Passage::cited)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders `"<template> <END_OF_PROMPT>"` with `context` and `query` filled in.
pub fn compose_prompt(template: &str, context: &str, query: &str) -> String {
    let full = format!("{} {}", template, END_OF_PROMPT);
    render(&full, context, query)
}

/// Single-pass substitution: replacement text is never scanned again, so a
/// passage or query containing `{query}` stays literal.
fn render(template: &str, context: &str, query: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + query.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUERY_PLACEHOLDER) {
            out.push_str(query);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
