

use super::models::{Origin, QueryAnalysis, QueryType, RetrievalResult, RoutedResults};
use crate::core::RouterConfig;
use crate::utils::safe_truncate_ellipsis;


/// Render the fused results as a context block for a text generator.
///
/// Returns `None` when nothing was retrieved. At most
/// `config.max_context_results` entries are written, in fused order.
pub fn format_context(routed: &RoutedResults, query: &str, config: &RouterConfig) -> Option<String> {
    if routed.combined.is_empty() {
        return None;
    }

    let analysis = &routed.analysis;
    let shown = routed.combined.len().min(config.max_context_results);

    let mut output = String::new();
    output.push_str(&format!("Product context for: \"{}\"\n", query.trim()));
    output.push_str(&format!(
        "Intent: {} (confidence {})\n",
        analysis.query_type, analysis.confidence
    ));
    if routed.combined.len() > shown {
        output.push_str(&format!("Showing {} of {} matches\n", shown, routed.combined.len()));
    }

    for (i, result) in routed.combined.iter().take(shown).enumerate() {
        output.push('\n');
        output.push_str(&format_entry(i + 1, result, analysis, config));
    }

    Some(output)
}


fn provenance(result: &RetrievalResult) -> String {
    match (result.origin, result.relevance_score) {
        (Origin::Structured, _) => "EXACT MATCH".to_string(),
        (Origin::Semantic, Some(score)) => format!("SEMANTIC MATCH (score {:.2})", score),
        (Origin::Semantic, None) => "SEMANTIC MATCH".to_string(),
    }
}


fn push_field(output: &mut String, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        output.push_str(&format!("{}: {}\n", label, value));
    }
}


fn format_entry(position: usize, result: &RetrievalResult, analysis: &QueryAnalysis, config: &RouterConfig) -> String {
    let record = &result.record;
    let mut output = String::new();

    output.push_str(&format!("[{}] {}\n", position, provenance(result)));
    push_field(&mut output, "Part number", &record.part_number);
    push_field(&mut output, "Name", &record.name);
    push_field(&mut output, "Description", &safe_truncate_ellipsis(&record.description, config.max_text_chars));
    push_field(&mut output, "Category", &record.category);
    push_field(&mut output, "Brand", &record.brand);

    if !record.replace_parts.is_empty() {
        output.push_str(&format!("Replaces: {}\n", record.replace_parts.join(", ")));
    }
    if !record.compatible_models.is_empty() {
        output.push_str(&format!(
            "Compatible models: {}\n",
            capped_list(&record.compatible_models, config.max_listed_models)
        ));
    }

    if let Some(price) = &record.price {
        push_field(&mut output, "Price", price);
    }
    push_field(&mut output, "Availability", &record.availability);
    push_field(&mut output, "URL", &record.url);

    match analysis.query_type {
        QueryType::Installation => push_field(
            &mut output,
            "Installation",
            &safe_truncate_ellipsis(&record.installation, config.max_text_chars),
        ),
        QueryType::Troubleshooting => push_field(
            &mut output,
            "Troubleshooting",
            &safe_truncate_ellipsis(&record.troubleshooting, config.max_text_chars),
        ),
        _ => {}
    }

    for model in &analysis.entities.model_numbers {
        if record.is_compatible_with(model) {
            output.push_str(&format!("Fits {}: yes\n", model));
        } else if analysis.query_type == QueryType::Compatibility {
            output.push_str(&format!("Fits {}: not listed as compatible\n", model));
        }
    }

    let why: Vec<String> = result
        .match_reasons
        .iter()
        .filter(|reason| reason.is_relationship())
        .map(ToString::to_string)
        .collect();
    if !why.is_empty() {
        output.push_str(&format!("Why: {}\n", why.join("; ")));
    }

    output
}


fn capped_list(items: &[String], max: usize) -> String {
    if items.len() <= max {
        return items.join(", ");
    }
    format!("{} and {} more", items[..max].join(", "), items.len() - max)
}
