//! Prompts for the research model and the relevance judge.
//!
//! The research call is a single turn, so the prompt has to carry the whole
//! methodology up front.

use shared::research::Citation;

/// Characters of the answer shown to the relevance judge.
pub const ANSWER_EXCERPT_CHARS: usize = 1000;

const CONTEXT_RULE: &str =
    "═══════════════════════════════════════════════════════════";

/// Build the deep research prompt, optionally prefixed with business context.
pub fn build_research_prompt(question: &str, website_context: Option<&str>) -> String {
    let base_prompt = format!(
        r#"DEEP RESEARCH TASK:
{question}

RESEARCH METHODOLOGY:
1. Break this question into 3-5 focused sub-questions that cover different aspects.
2. For each sub-question:
   - Use Google Search to find the most current, authoritative information.
   - Analyze multiple sources to identify patterns and consensus.
   - Note any conflicting viewpoints or data.
3. Synthesize all findings into a comprehensive, well-structured answer.
4. Include specific examples, data points, and statistics where relevant.
5. Cite ALL sources with proper attribution.

RESEARCH QUALITY STANDARDS:
- Prioritize recent sources for current trends.
- Cross-reference multiple authoritative sources.
- Distinguish between facts, opinions, and predictions.
- Acknowledge uncertainties or knowledge gaps.
- Provide actionable insights, not just information.

Begin your deep research now."#,
        question = question.trim()
    );

    let context = match website_context.map(str::trim) {
        Some(ctx) if !ctx.is_empty() => ctx,
        _ => return base_prompt,
    };

    format!(
        r#"{rule}
BUSINESS CONTEXT (reference when the user says "we/our/company")
{rule}
{context}
{rule}

Use the above context when discussing the user's company or product.


{base_prompt}"#,
        rule = CONTEXT_RULE,
    )
}

/// Build the classification prompt for one citation.
pub fn build_relevance_prompt(question: &str, answer: &str, citation: &Citation) -> String {
    let excerpt: String = answer.chars().take(ANSWER_EXCERPT_CHARS).collect();
    let description = citation
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("Description: {}\n", d.trim()))
        .unwrap_or_default();

    format!(
        r#"You are a citation verification expert.

ORIGINAL QUESTION:
{question}

EXCERPT FROM ANSWER:
{excerpt}...

CITED SOURCE:
Title: {title}
URL: {url}
{description}
TASK:
Decide whether the cited source appears relevant and credible for the claims above.

Respond with exactly:
- "RELEVANT" or
- "QUESTIONABLE" or
- "IRRELEVANT"

Then on a new line, give a short (≤15 words) reason.
"#,
        title = citation.title,
        url = citation.url,
    )
}
