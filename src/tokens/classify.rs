//! Token classification: which float variables count as spacing or radius
//! tokens, and the value → token index used for exact matching.

use std::sync::{Arc, LazyLock};

use hashbrown::HashMap;
use regex::Regex;

use crate::model::{Category, ResolvedType, Token, TokenRecord, VariableValue};

static SPACING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)space|spacing|gap|padding|margin|size|grid").expect("spacing pattern is valid")
});

static RADIUS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)radius|corner|rounded|border.*radius|br-").expect("radius pattern is valid")
});

/// Name pattern for a category.
pub fn name_pattern(category: Category) -> &'static Regex {
    match category {
        Category::Spacing => &SPACING_NAME,
        Category::BorderRadius => &RADIUS_NAME,
    }
}

pub fn name_matches(category: Category, name: &str) -> bool {
    name_pattern(category).is_match(name)
}

/// Worth resolving at all: matches either category.
pub fn is_candidate_name(name: &str) -> bool {
    SPACING_NAME.is_match(name) || RADIUS_NAME.is_match(name)
}

/// Reduce records to the tokens of one category, optionally limited to a collection.
///
/// Emission order follows input order.
pub fn classify(
    records: &[Arc<TokenRecord>],
    category: Category,
    collection: Option<&str>,
) -> Vec<Token> {
    let mut tokens = Vec::new();
    for record in records {
        if record.resolved_type != ResolvedType::Float {
            continue;
        }
        if collection.is_some_and(|c| c != record.collection_id) {
            continue;
        }
        let Some(first) = record.first_mode_value() else {
            continue;
        };
        let Some(value) = first.as_float() else {
            continue;
        };
        if value.is_nan() || value < 0.0 {
            continue;
        }
        if !name_matches(category, &record.name) {
            continue;
        }
        tokens.push(Token::from_record(Arc::clone(record), value));
    }
    tokens
}

/// Exact-value lookup. On duplicate values the later token wins.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    by_value: HashMap<u64, Token>,
}

impl TokenIndex {
    pub fn build(tokens: &[Token]) -> Self {
        let mut by_value = HashMap::with_capacity(tokens.len());
        for token in tokens {
            if let Some(shadowed) = by_value.insert(value_key(token.value), token.clone()) {
                tracing::debug!(
                    value = token.value,
                    kept = %token.name,
                    shadowed = %shadowed.name,
                    "token value collision; later token wins"
                );
            }
        }
        Self { by_value }
    }

    pub fn get(&self, value: f64) -> Option<&Token> {
        self.by_value.get(&value_key(value))
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}

fn value_key(value: f64) -> u64 {
    // -0.0 and 0.0 are the same value
    if value == 0.0 { 0 } else { value.to_bits() }
}

/// First-mode float of a record, if it is one.
pub fn first_float(record: &TokenRecord) -> Option<f64> {
    record.first_mode_value().and_then(VariableValue::as_float)
}
