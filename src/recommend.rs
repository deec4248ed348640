//! Chatbot-style product recommendations.
//!
//! A shopper's free-text message is reduced to a handful of hints (category,
//! cloth type, size, price cap, free keywords) and matched against the live
//! catalog. Only products with at least one purchasable size are suggested.

use std::sync::Arc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;
use crate::inventory::policy::{any_in_stock, is_in_stock};
use crate::inventory::sync::LiveCatalog;

pub const DEFAULT_LIMIT: usize = 4;
const MAX_LIMIT: usize = 20;
const UNISEX: &str = "unisex";
const PRICE_CAP_WORDS: &[&str] = &["under", "below", "within", "max", "upto"];
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "show", "want", "need", "looking", "something", "some", "any", "please",
    "size", "under", "below", "within", "upto", "rs", "inr", "can", "you", "have", "get", "buy", "me",
];

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub message: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// What was understood from the message.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub category: Option<String>,
    pub cloth_type: Option<String>,
    pub size: Option<String>,
    pub max_price: Option<Decimal>,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub product_id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub rating: f32,
    pub image: Option<String>,
    pub sizes_in_stock: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReply {
    pub reply: String,
    pub preferences: Preferences,
    pub suggestions: Vec<Suggestion>,
}

fn tokens(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '.')
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn squash(s: &str) -> String { s.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_lowercase() }

/// Extracts hints using the vocabulary the catalog actually carries.
pub fn parse_message(message: &str, products: &[Product]) -> Preferences {
    let words = tokens(message);
    let squashed = squash(message);

    let category = products
        .iter()
        .map(|p| p.category.as_str())
        .find(|c| !c.eq_ignore_ascii_case(UNISEX) && words.iter().any(|w| w == &c.to_lowercase() || w.trim_end_matches('s') == c.to_lowercase()))
        .map(str::to_string);

    // longest match wins so "t-shirt" is not read as "shirt"
    let cloth_type = products
        .iter()
        .map(|p| p.cloth_type.as_str())
        .filter(|t| {
            let t = squash(t);
            squashed.contains(&t) || squashed.contains(t.trim_end_matches('s'))
        })
        .max_by_key(|t| squash(t).len())
        .map(str::to_string);

    let sizes: Vec<&str> = products.iter().flat_map(|p| p.variations.iter().filter_map(|v| v.size())).collect();
    let size = words.iter().enumerate().find_map(|(i, w)| {
        let explicit = i > 0 && words[i - 1] == "size";
        // single letters are too ambiguous without "size" in front
        let candidate = sizes.iter().find(|s| s.eq_ignore_ascii_case(w))?;
        (explicit || candidate.len() > 1 && candidate.parse::<u32>().is_err()).then(|| candidate.to_string())
    });

    let max_price = words.windows(2).find_map(|pair| {
        if !PRICE_CAP_WORDS.contains(&pair[0].as_str()) { return None; }
        pair[1].parse::<Decimal>().ok()
    });

    let vocabulary: Vec<String> = [category.as_deref(), cloth_type.as_deref(), size.as_deref()]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();
    let keywords = words
        .into_iter()
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(&w.as_str()) && w.parse::<Decimal>().is_err())
        .filter(|w| !vocabulary.iter().any(|v| squash(v).contains(w.trim_end_matches('s'))))
        .collect();
    Preferences { category, cloth_type, size, max_price, keywords }
}

fn satisfies(product: &Product, prefs: &Preferences) -> bool {
    if !any_in_stock(product) { return false; }
    if let Some(category) = &prefs.category {
        if !product.category.eq_ignore_ascii_case(category) && !product.category.eq_ignore_ascii_case(UNISEX) { return false; }
    }
    if let Some(cloth_type) = &prefs.cloth_type {
        if !product.cloth_type.eq_ignore_ascii_case(cloth_type) { return false; }
    }
    if let Some(size) = &prefs.size {
        if !product.variations.iter().any(|v| is_in_stock(v) && v.size().is_some_and(|s| s.eq_ignore_ascii_case(size))) { return false; }
    }
    if let Some(max) = prefs.max_price {
        if product.display_price(None).price > max { return false; }
    }
    true
}

fn keyword_hits(product: &Product, keywords: &[String]) -> usize {
    let haystack = format!("{} {} {}", product.name, product.brand, product.description).to_lowercase();
    keywords.iter().filter(|k| haystack.contains(k.trim_end_matches('s'))).count()
}

/// Matching products, best keyword match first, then by rating.
pub fn recommend(products: &[Product], prefs: &Preferences, limit: usize) -> Vec<Suggestion> {
    let mut ranked: Vec<(usize, &Product)> = products
        .iter()
        .filter(|p| satisfies(p, prefs))
        .map(|p| (keyword_hits(p, &prefs.keywords), p))
        .collect();
    ranked.sort_by(|(ha, a), (hb, b)| hb.cmp(ha).then(b.rating.total_cmp(&a.rating)).then(a.id.cmp(&b.id)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, p)| Suggestion {
            product_id: p.id,
            name: p.name.clone(),
            brand: p.brand.clone(),
            price: p.display_price(None).price,
            rating: p.rating,
            image: p.primary_image().map(str::to_string),
            sizes_in_stock: p.variations.iter().filter(|v| is_in_stock(v)).filter_map(|v| v.size().map(str::to_string)).collect(),
        })
        .collect()
}

fn reply_text(prefs: &Preferences, suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "Sorry, I couldn't find anything in stock for that. Try another size or a higher budget.".to_string();
    }
    let mut what = prefs.cloth_type.clone().unwrap_or_else(|| "picks".to_string());
    if let Some(category) = &prefs.category { what = format!("{category}'s {what}"); }
    let mut reply = format!("Here are {} {what}", suggestions.len());
    if let Some(size) = &prefs.size { reply.push_str(&format!(" in size {size}")); }
    if let Some(max) = prefs.max_price { reply.push_str(&format!(" under {max}")); }
    reply.push_str(" for you.");
    reply
}

pub struct Recommender { live: Arc<LiveCatalog> }

impl Recommender {
    pub fn new(live: Arc<LiveCatalog>) -> Self { Self { live } }

    #[tracing::instrument(skip_all)]
    pub async fn respond(&self, request: &RecommendationRequest) -> RecommendationReply {
        self.live.refresh(None).await;
        let products = self.live.products().await;
        let preferences = parse_message(&request.message, &products);
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let suggestions = recommend(&products, &preferences, limit);
        tracing::debug!(?preferences, matched = suggestions.len(), "Recommendation request");
        RecommendationReply { reply: reply_text(&preferences, &suggestions), preferences, suggestions }
    }
}
