//! Recherche d'actifs : plein-texte + filtres à tags, pagination.
//!
//! Tient lieu de l'index de recherche du store de référence : le corpus
//! est la liste des documents actifs, la requête un AND de tokens
//! insensibles à la casse sur id/nom/fabricant/modèle.

use crate::models::Asset;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Texte libre ; vide ou "*" = tout matcher
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

pub struct SearchResult {
    pub total: usize,
    pub assets: Vec<Asset>,
}

pub fn search_assets(assets: &[Asset], params: &SearchParams) -> SearchResult {
    let tokens: Vec<String> = if params.q.is_empty() || params.q == "*" {
        Vec::new()
    } else {
        params.q.split_whitespace().map(str::to_lowercase).collect()
    };

    let matches: Vec<Asset> = assets
        .iter()
        .filter(|asset| matches_text(asset, &tokens) && matches_filters(asset, params))
        .cloned()
        .collect();

    let total = matches.len();
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(20);
    let assets = matches.into_iter().skip(offset).take(limit).collect();

    SearchResult { total, assets }
}

fn matches_text(asset: &Asset, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {} {}",
        asset.id, asset.name, asset.manufacturer, asset.model_number
    )
    .to_lowercase();
    tokens.iter().all(|token| haystack.contains(token))
}

fn matches_filters(asset: &Asset, params: &SearchParams) -> bool {
    // filtre absent ou vide = pas de contrainte
    let tag_eq = |filter: &Option<String>, value: &str| match filter.as_deref() {
        Some(f) if !f.is_empty() => f == value,
        _ => true,
    };

    tag_eq(&params.asset_type, asset.asset_type.as_str())
        && tag_eq(&params.manufacturer, &asset.manufacturer)
        && tag_eq(&params.status, asset.status.as_str())
        && tag_eq(&params.team, &asset.maintenance.maintenance_team)
}

/// Valeurs distinctes d'un champ filtrable, pour l'autocomplétion.
/// Retourne None pour un champ non filtrable.
pub fn suggestions(assets: &[Asset], field: &str) -> Option<Vec<String>> {
    let mut values: Vec<String> = match field {
        "type" => assets.iter().map(|a| a.asset_type.as_str().to_string()).collect(),
        "manufacturer" => assets.iter().map(|a| a.manufacturer.clone()).collect(),
        "status" => assets.iter().map(|a| a.status.as_str().to_string()).collect(),
        "team" => assets.iter().map(|a| a.maintenance.maintenance_team.clone()).collect(),
        _ => return None,
    };
    values.sort();
    values.dedup();
    Some(values)
}
