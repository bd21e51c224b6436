//! Line-oriented parser for language-model card replies.
//!
//! The generation prompt asks for one card per line with the two sides
//! separated by a single `;`. Parsing is best-effort: lines that do not
//! follow that shape are skipped and counted, never reported as errors.

use uuid::Uuid;

use super::Card;

/// Separator between the front and back fields of a card line.
pub const FIELD_SEPARATOR: char = ';';

/// Cards extracted from a reply, plus how many non-empty lines were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCards {
    pub cards: Vec<Card>,
    /// Non-empty lines skipped because they had no separator or an empty side
    pub dropped: usize,
}

impl ParsedCards {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Parse a raw model reply into cards, preserving line order.
///
/// Only the first `;` on a line splits front from back; any later `;`
/// characters stay in the back field verbatim.
pub fn parse_cards(raw: &str) -> ParsedCards {
    let mut parsed = ParsedCards::default();

    for line in raw.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some(card) => parsed.cards.push(card),
            None => parsed.dropped += 1,
        }
    }

    parsed
}

fn parse_line(line: &str) -> Option<Card> {
    let (front, back) = line.split_once(FIELD_SEPARATOR)?;
    let (front, back) = (front.trim(), back.trim());
    if front.is_empty() || back.is_empty() {
        return None;
    }

    Some(Card {
        id: Uuid::new_v4().to_string(),
        front: front.to_string(),
        back: back.to_string(),
    })
}
