

use std::collections::HashSet;
use lazy_static::lazy_static;
use regex::Regex;

use super::models::ExtractedEntities;
use crate::utils::push_unique;


pub const BRAND_VOCABULARY: &[&str] = &[
    "whirlpool", "ge", "frigidaire", "samsung", "lg", "kenmore", "maytag",
    "kitchenaid", "bosch", "electrolux", "amana", "jenn-air", "hotpoint",
    "haier", "beko", "miele", "thermador", "fisher & paykel", "sub-zero",
    "dacor", "gaggenau", "viking", "hisense", "midea", "insignia",
    "admiral", "roper", "crosley",
];

const MIN_MODEL_LEN: usize = 5;

lazy_static! {
    static ref PART_PREFIXED: Regex = Regex::new(r"(?i)\b([a-z]{2,3})(\d{5,10})\b").unwrap();

    static ref PART_BARE: Regex =
        Regex::new(r"(?i)(?:\b(?:part(?:\s*(?:number|no\.?|#))?|p/n|pn)\s*[:#]?\s*|#\s*)?\b(\d{5,10})\b").unwrap();

    static ref MODEL_ALNUM: Regex = Regex::new(r"(?i)\b[a-z]{2,4}-?\d[\d-]*[a-z0-9]*\b").unwrap();

    static ref MODEL_NUMERIC: Regex = Regex::new(r"\b\d{8,12}\b").unwrap();

    static ref BRAND_PATTERNS: Vec<(&'static str, Regex)> = BRAND_VOCABULARY
        .iter()
        .map(|brand| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(brand));
            (*brand, Regex::new(&pattern).unwrap())
        })
        .collect();
}


struct PartCandidate {
    start: usize,
    normalized: String,
    digits: String,
    prefixed: bool,
}


/// Pull part numbers, model numbers and brands out of free text.
///
/// Never fails and is a pure function of its input. Part numbers are
/// extracted first and model candidates that overlap any of them are
/// dropped, so the two lists are disjoint.
pub fn extract(query: &str) -> ExtractedEntities {
    let part_numbers = extract_part_numbers(query);
    let model_numbers = extract_model_numbers(query, &part_numbers);
    let brands = extract_brands(query);

    ExtractedEntities {
        part_numbers,
        model_numbers,
        brands,
    }
}


pub fn extract_part_numbers(query: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for caps in PART_PREFIXED.captures_iter(query) {
        let (Some(whole), Some(prefix), Some(digits)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        candidates.push(PartCandidate {
            start: whole.start(),
            normalized: format!("{}{}", prefix.as_str().to_uppercase(), digits.as_str()),
            digits: digits.as_str().to_string(),
            prefixed: true,
        });
    }

    for caps in PART_BARE.captures_iter(query) {
        let Some(digits) = caps.get(1) else { continue };
        candidates.push(PartCandidate {
            start: digits.start(),
            normalized: digits.as_str().to_string(),
            digits: digits.as_str().to_string(),
            prefixed: false,
        });
    }

    let prefixed_digits: HashSet<String> = candidates
        .iter()
        .filter(|c| c.prefixed)
        .map(|c| c.digits.clone())
        .collect();

    candidates.sort_by_key(|c| c.start);

    let mut parts = Vec::new();
    for candidate in candidates {
        if !candidate.prefixed && prefixed_digits.contains(&candidate.digits) {
            continue;
        }
        push_unique(&mut parts, candidate.normalized);
    }
    parts
}


/// Model numbers, excluding anything equal to, inside, or containing one of
/// `part_numbers` (or its digit run).
pub fn extract_model_numbers(query: &str, part_numbers: &[String]) -> Vec<String> {
    let mut candidates: Vec<(usize, String)> = Vec::new();

    for m in MODEL_ALNUM.find_iter(query) {
        let normalized = m.as_str().trim_end_matches('-').to_uppercase();
        if normalized.len() >= MIN_MODEL_LEN {
            candidates.push((m.start(), normalized));
        }
    }
    for m in MODEL_NUMERIC.find_iter(query) {
        candidates.push((m.start(), m.as_str().to_string()));
    }

    candidates.sort_by_key(|(start, _)| *start);

    let mut models = Vec::new();
    for (_, candidate) in candidates {
        if overlaps_part_number(&candidate, part_numbers) {
            continue;
        }
        push_unique(&mut models, candidate);
    }
    models
}


fn overlaps_part_number(candidate: &str, part_numbers: &[String]) -> bool {
    part_numbers.iter().any(|part| {
        let digits: String = part.chars().filter(|c| c.is_ascii_digit()).collect();
        [part.as_str(), digits.as_str()]
            .iter()
            .filter(|form| !form.is_empty())
            .any(|form| candidate.contains(form) || form.contains(candidate))
    })
}


/// Brands from the fixed vocabulary, word-bounded and case-insensitive,
/// ordered by first mention.
pub fn extract_brands(query: &str) -> Vec<String> {
    let mut found: Vec<(usize, &'static str)> = BRAND_PATTERNS
        .iter()
        .filter_map(|(brand, pattern)| pattern.find(query).map(|m| (m.start(), *brand)))
        .collect();

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, brand)| brand.to_string()).collect()
}
