//! Terminal rendering for progress events and the final result.

use shared::events::ResearchEvent;
use shared::research::{ResearchResult, VerificationStatus};
use std::fmt::{self, Write};

pub fn print_event(event: &ResearchEvent) {
    match event {
        ResearchEvent::Started { .. } => {}
        ResearchEvent::ModelResponded {
            citations,
            search_queries,
        } => {
            eprintln!(
                "  model answered: {} sources from {} searches",
                citations, search_queries
            );
        }
        ResearchEvent::FallbackUsed { count } => {
            eprintln!("  no grounded sources, citing {} search queries instead", count);
        }
        ResearchEvent::CitationVerified {
            url,
            status,
            confidence,
        } => {
            eprintln!("  {} {} ({}%)", status_icon(*status), url, confidence);
        }
        ResearchEvent::Completed { .. } => {}
    }
}

pub fn print_result(result: &ResearchResult) -> serde_json::Result<()> {
    print!("{}", render_result(result)?);
    Ok(())
}

/// Human-readable report followed by the full JSON result.
pub fn render_result(result: &ResearchResult) -> serde_json::Result<String> {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, result);
    let _ = writeln!(out, "\nRaw JSON:");
    let _ = writeln!(out, "{}", serde_json::to_string_pretty(result)?);
    Ok(out)
}

fn write_summary(out: &mut String, result: &ResearchResult) -> fmt::Result {
    writeln!(out, "{}\n", result.content)?;

    if result.citations.is_empty() {
        writeln!(out, "No sources cited.")?;
    } else {
        writeln!(
            out,
            "Sources ({} valid, {} warning, {} failed):",
            result.count_by_status(VerificationStatus::Valid),
            result.count_by_status(VerificationStatus::Warning),
            result.count_by_status(VerificationStatus::Failed),
        )?;
        for verified in &result.citations {
            writeln!(
                out,
                "- [{}] ({}%) {} — {}",
                verified.verification_status,
                verified.confidence(),
                verified.citation.title,
                verified.citation.url
            )?;
            for issue in &verified.verification_details.issues {
                writeln!(out, "    · {}", issue)?;
            }
        }
    }

    let meta = &result.metadata;
    writeln!(out)?;
    writeln!(out, "Model: {}", meta.model)?;
    if !meta.search_queries.is_empty() {
        writeln!(out, "Searches: {}", meta.search_queries.join(" | "))?;
    }
    if let Some(total) = meta.usage.as_ref().and_then(|u| u.total_token_count) {
        match meta.estimated_cost_usd {
            Some(cost) => writeln!(out, "Tokens: {} (≈ ${:.4})", total, cost)?,
            None => writeln!(out, "Tokens: {}", total)?,
        }
    }
    Ok(())
}

fn status_icon(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Valid => "✓",
        VerificationStatus::Warning => "!",
        VerificationStatus::Failed => "✗",
    }
}

/// Turn a failed run into something a person can act on.
pub fn format_error_message(error: &str) -> String {
    let error_lower = error.to_lowercase();

    // API key issues
    if error_lower.contains("unauthorized")
        || error_lower.contains("401")
        || error_lower.contains("403")
        || error_lower.contains("api key not valid")
    {
        return format!(
            "Gemini rejected the request. Check that GEMINI_API_KEY is valid.\n\nError: {}",
            error
        );
    }

    // Rate limiting and quota
    if error_lower.contains("429")
        || error_lower.contains("resource_exhausted")
        || error_lower.contains("quota")
    {
        return format!(
            "Gemini is rate limiting this key. Wait a moment and try again.\n\nError: {}",
            error
        );
    }

    if error_lower.contains("timed out") || error_lower.contains("timeout") {
        return format!(
            "The research call took too long. Deep research can run for several minutes; \
            try a narrower question.\n\nError: {}",
            error
        );
    }

    if error_lower.contains("connection") || error_lower.contains("dns") {
        return format!(
            "Could not reach the Gemini API. Check your network connection.\n\nError: {}",
            error
        );
    }

    format!("Deep research failed:\n\n{}", error)
}
