

use futures::future::try_join_all;
use tracing::debug;

use super::models::{dedupe_by_id, filter_by_brand, MatchReason, RetrievalResult};
use crate::db::{CatalogError, CatalogStore};


/// Exact catalog lookups for every extracted identifier.
///
/// Fetches run concurrently but results keep extraction order: each part's
/// direct hit and replacements, then each model's compatible parts. The brand
/// filter applies to every set, direct part hits included.
pub async fn lookup_structured(
    catalog: &dyn CatalogStore,
    part_numbers: &[String],
    model_numbers: &[String],
    brands: &[String],
) -> Result<Vec<RetrievalResult>, CatalogError> {
    if part_numbers.is_empty() && model_numbers.is_empty() {
        return Ok(Vec::new());
    }

    let part_hits = try_join_all(part_numbers.iter().map(|part| lookup_part(catalog, part)));
    let model_hits = try_join_all(model_numbers.iter().map(|model| lookup_model(catalog, model)));
    let (part_hits, model_hits) = futures::try_join!(part_hits, model_hits)?;

    let results: Vec<RetrievalResult> = part_hits
        .into_iter()
        .chain(model_hits)
        .flatten()
        .collect();
    let fetched = results.len();

    let results = dedupe_by_id(filter_by_brand(results, brands), false);
    debug!(
        "Structured lookup: {} parts, {} models -> {} fetched, {} kept",
        part_numbers.len(),
        model_numbers.len(),
        fetched,
        results.len()
    );
    Ok(results)
}


async fn lookup_part(catalog: &dyn CatalogStore, part_number: &str) -> Result<Vec<RetrievalResult>, CatalogError> {
    let (direct, replacing) = futures::try_join!(
        catalog.get_by_id(part_number),
        catalog.find_by_replaced_part(part_number)
    )?;

    let mut results = Vec::with_capacity(replacing.len() + 1);
    if let Some(record) = direct {
        results.push(RetrievalResult::structured(record, MatchReason::PartNumber(part_number.to_string())));
    }
    results.extend(
        replacing
            .into_iter()
            .map(|record| RetrievalResult::structured(record, MatchReason::ReplacesPart(part_number.to_string()))),
    );
    Ok(results)
}


async fn lookup_model(catalog: &dyn CatalogStore, model_number: &str) -> Result<Vec<RetrievalResult>, CatalogError> {
    Ok(catalog
        .find_by_compatible_model(model_number)
        .await?
        .into_iter()
        .map(|record| RetrievalResult::structured(record, MatchReason::CompatibleModel(model_number.to_string())))
        .collect())
}
