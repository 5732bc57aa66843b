//! Sectioned script content.

use scriptorium_core::GenerationRequest;

/// Assemble a variant body from the request's product data and a script text.
///
/// The body always has a `## Product` block and a `## Script` block; a
/// `## Details` block lists the remaining product metadata when there is any.
///
/// # Examples
///
/// ```
/// use scriptorium_core::GenerationRequest;
/// use scriptorium_generation::compose_content;
///
/// let body = compose_content(&GenerationRequest::new("p1", 1), "Buy it.");
/// assert_eq!(body, "## Product\np1\n\n## Script\nBuy it.");
/// ```
pub fn compose_content(request: &GenerationRequest, script: &str) -> String {
    let mut sections = vec![format!("## Product\n{}", request.product_name())];

    let details = request.detail_lines();
    if !details.is_empty() {
        let lines: Vec<String> = details.iter().map(|d| format!("- {}", d)).collect();
        sections.push(format!("## Details\n{}", lines.join("\n")));
    }

    sections.push(format!("## Script\n{}", script.trim()));
    sections.join("\n\n")
}
