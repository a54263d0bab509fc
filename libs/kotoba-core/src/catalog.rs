//! Card catalog loading.
//!
//! The source of truth is a vocabulary CSV
//! (`Deck, Japanese, Hiragana, English, Example{1..3}_{JP,Hiragana,EN}, Tags, Notes`).
//! Card identity is derived from the deck and term fields so the same logical
//! card maps to the same id across reloads.

use crate::error::CatalogError;
use crate::types::{Card, Example};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Read;

/// Deterministic card id: SHA-256 over the deck and term fields, truncated
/// to 12 hex chars.
pub fn card_id(deck: &str, japanese: &str, english: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(deck.as_bytes());
    hasher.update([0]);
    hasher.update(japanese.as_bytes());
    hasher.update([0]);
    hasher.update(english.as_bytes());
    let digest = hasher.finalize();
    let mut id = String::with_capacity(12);
    for byte in &digest[..6] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

/// One row of the vocabulary CSV. Unknown columns are ignored; missing
/// optional columns default to empty.
#[derive(Debug, Deserialize)]
struct VocabRow {
    #[serde(rename = "Deck", default)]
    deck: String,
    #[serde(rename = "Japanese", default)]
    japanese: String,
    #[serde(rename = "Hiragana", default)]
    hiragana: String,
    #[serde(rename = "English", default)]
    english: String,
    #[serde(rename = "Example1_JP", default)]
    example1_jp: String,
    #[serde(rename = "Example1_Hiragana", default)]
    example1_hiragana: String,
    #[serde(rename = "Example1_EN", default)]
    example1_en: String,
    #[serde(rename = "Example2_JP", default)]
    example2_jp: String,
    #[serde(rename = "Example2_Hiragana", default)]
    example2_hiragana: String,
    #[serde(rename = "Example2_EN", default)]
    example2_en: String,
    #[serde(rename = "Example3_JP", default)]
    example3_jp: String,
    #[serde(rename = "Example3_Hiragana", default)]
    example3_hiragana: String,
    #[serde(rename = "Example3_EN", default)]
    example3_en: String,
    #[serde(rename = "Tags", default)]
    tags: String,
    #[serde(rename = "Notes", default)]
    notes: String,
}

impl VocabRow {
    fn is_empty(&self) -> bool {
        self.deck.trim().is_empty()
            && self.japanese.trim().is_empty()
            && self.english.trim().is_empty()
    }

    fn into_card(self, row: usize) -> Result<Card, CatalogError> {
        let deck = self.deck.trim();
        let japanese = self.japanese.trim();
        let english = self.english.trim();
        if deck.is_empty() {
            return Err(CatalogError::MissingField { row, field: "Deck" });
        }
        if japanese.is_empty() {
            return Err(CatalogError::MissingField { row, field: "Japanese" });
        }
        if english.is_empty() {
            return Err(CatalogError::MissingField { row, field: "English" });
        }

        let examples = [
            (self.example1_jp, self.example1_hiragana, self.example1_en),
            (self.example2_jp, self.example2_hiragana, self.example2_en),
            (self.example3_jp, self.example3_hiragana, self.example3_en),
        ]
        .into_iter()
        .filter(|(jp, hiragana, en)| {
            !(jp.trim().is_empty() && hiragana.trim().is_empty() && en.trim().is_empty())
        })
        .map(|(jp, hiragana, en)| Example {
            jp: jp.trim().to_string(),
            hiragana: hiragana.trim().to_string(),
            en: en.trim().to_string(),
        })
        .collect();

        Ok(Card {
            id: card_id(deck, japanese, english),
            deck_id: deck.to_string(),
            japanese: japanese.to_string(),
            hiragana: self.hiragana.trim().to_string(),
            english: english.to_string(),
            examples,
            tags: self.tags.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Ordered, immutable card collection with id lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: Vec<Card>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-constructed cards, rejecting duplicates.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            if by_id.insert(card.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateCard {
                    row: idx + 2,
                    id: card.id.clone(),
                });
            }
        }
        Ok(Self { cards, by_id })
    }

    /// Parse the vocabulary CSV. Fully empty rows are skipped.
    pub fn load_csv<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut cards = Vec::new();
        for (idx, record) in csv_reader.deserialize::<VocabRow>().enumerate() {
            // +2: one for the header line, one for zero-based enumerate
            let row = idx + 2;
            let vocab_row = record?;
            if vocab_row.is_empty() {
                continue;
            }
            cards.push(vocab_row.into_card(row)?);
        }
        tracing::debug!(cards = cards.len(), "catalog loaded");
        Self::from_cards(cards)
    }

    pub fn get(&self, card_id: &str) -> Option<&Card> {
        self.by_id.get(card_id).map(|&idx| &self.cards[idx])
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards in a deck; `"all"` matches every deck.
    pub fn in_deck<'a>(&'a self, deck_id: &'a str) -> impl Iterator<Item = &'a Card> {
        self.cards
            .iter()
            .filter(move |card| deck_id == crate::types::ALL_DECKS || card.deck_id == deck_id)
    }

    /// Sorted unique deck ids.
    pub fn deck_ids(&self) -> Vec<String> {
        let mut decks: Vec<String> = self.cards.iter().map(|c| c.deck_id.clone()).collect();
        decks.sort();
        decks.dedup();
        decks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Deck,Japanese,Hiragana,English,Example1_JP,Example1_Hiragana,Example1_EN
n5,猫,ねこ,cat,猫がいます。,ねこがいます。,There is a cat.
n5,犬,いぬ,dog,,,
n4,走る,はしる,to run,,,
";

    #[test]
    fn ids_are_deterministic() {
        assert_eq!(card_id("n5", "猫", "cat"), card_id("n5", "猫", "cat"));
        assert_ne!(card_id("n5", "猫", "cat"), card_id("n4", "猫", "cat"));
        assert_eq!(card_id("n5", "猫", "cat").len(), 12);
    }

    #[test]
    fn loads_rows_and_examples() {
        let catalog = Catalog::load_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        let cat = &catalog.cards()[0];
        assert_eq!(cat.japanese, "猫");
        assert_eq!(cat.hiragana, "ねこ");
        assert_eq!(cat.english, "cat");
        assert_eq!(cat.examples.len(), 1);
        assert_eq!(cat.examples[0].en, "There is a cat.");
        assert!(catalog.cards()[1].examples.is_empty());
        assert_eq!(catalog.get(&cat.id).unwrap().japanese, "猫");
    }

    #[test]
    fn deck_filter_and_ids() {
        let catalog = Catalog::load_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.in_deck("n5").count(), 2);
        assert_eq!(catalog.in_deck("all").count(), 3);
        assert_eq!(catalog.deck_ids(), vec!["n4".to_string(), "n5".to_string()]);
    }

    #[test]
    fn missing_term_is_an_error() {
        let bad = "Deck,Japanese,Hiragana,English\nn5,,ねこ,cat\n";
        let err = Catalog::load_csv(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { row: 2, field: "Japanese" }));
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let dup = "Deck,Japanese,Hiragana,English\nn5,猫,ねこ,cat\nn5,猫,ねこ,cat\n";
        let err = Catalog::load_csv(dup.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCard { .. }));
    }

    #[test]
    fn empty_rows_are_skipped() {
        let sparse = "Deck,Japanese,Hiragana,English\nn5,猫,ねこ,cat\n,,,\n";
        let catalog = Catalog::load_csv(sparse.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
