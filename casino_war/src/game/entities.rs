use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use super::errors::GameError;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

    const fn symbol(self) -> char {
        match self {
            Self::Spade => 'S',
            Self::Heart => 'H',
            Self::Diamond => 'D',
            Self::Club => 'C',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Spade),
            'H' => Some(Self::Heart),
            'D' => Some(Self::Diamond),
            'C' => Some(Self::Club),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Card ranks with their comparison values (deuce low, ace high).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub const fn value(self) -> u8 {
        self as u8
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "T",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
        }
    }

    fn from_symbol(s: &str) -> Option<Self> {
        let rank = match s {
            "2" => Self::Two,
            "3" => Self::Three,
            "4" => Self::Four,
            "5" => Self::Five,
            "6" => Self::Six,
            "7" => Self::Seven,
            "8" => Self::Eight,
            "9" => Self::Nine,
            // Ten is emitted as "T" but "10" is accepted on input.
            "T" | "10" => Self::Ten,
            "J" => Self::Jack,
            "Q" => Self::Queen,
            "K" => Self::King,
            "A" => Self::Ace,
            _ => return None,
        };
        Some(rank)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A playing card. Comparison goes through [`Card::compare`], which looks
/// at rank alone; `Ord` is intentionally not implemented so suit can never
/// break a tie.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Compare by rank only.
    pub fn compare(self, other: Card) -> Ordering {
        self.rank.value().cmp(&other.rank.value())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidCard(s.to_string());
        if !s.is_ascii() {
            return Err(invalid());
        }
        let (rank_part, suit_part) = s.split_at(s.len().saturating_sub(1));
        let suit_char = suit_part.chars().next().ok_or_else(invalid)?;
        let rank = Rank::from_symbol(rank_part).ok_or_else(invalid)?;
        let suit = Suit::from_symbol(suit_char).ok_or_else(invalid)?;
        Ok(Self { rank, suit })
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A table position, ordered numerically. Seat "10" sorts after seat "2",
/// which a plain string key would get wrong.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SeatId(u8);

impl SeatId {
    pub const fn new(n: u8) -> Self {
        Self(n)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SeatId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>()
            .map(Self)
            .map_err(|_| GameError::InvalidSeatId(s.to_string()))
    }
}

impl Serialize for SeatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeatIdVisitor;

        impl serde::de::Visitor<'_> for SeatIdVisitor {
            type Value = SeatId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a seat id as a string or small integer")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<SeatId, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<SeatId, E> {
                u8::try_from(v)
                    .map(SeatId::new)
                    .map_err(|_| E::custom(GameError::InvalidSeatId(v.to_string())))
            }
        }

        deserializer.deserialize_any(SeatIdVisitor)
    }
}

/// Who a card assignment is aimed at.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DealTarget {
    Dealer,
    Player,
}

impl fmt::Display for DealTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Dealer => "dealer",
            Self::Player => "player",
        };
        write!(f, "{repr}")
    }
}

/// A tied seat's decision.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarChoice {
    War,
    Surrender,
}

impl fmt::Display for WarChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::War => "war",
            Self::Surrender => "surrender",
        };
        write!(f, "{repr}")
    }
}

/// Who supplies each card.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Manual,
    Automatic,
    Live,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Live => "live",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "automatic" => Ok(Self::Automatic),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown game mode {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Active,
    WaitingChoice,
    War,
    Finished,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::WaitingChoice => "waiting_choice",
            Self::War => "war",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// A settled seat's result for a round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Tie,
    Surrender,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Tie => "tie",
            Self::Surrender => "surrender",
        };
        write!(f, "{repr}")
    }
}

/// Per-round seat state. Reset to defaults when a new round begins.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Seat {
    pub card: Option<Card>,
    pub status: SeatStatus,
    pub result: Option<Outcome>,
    pub war_card: Option<Card>,
}

impl Default for Seat {
    fn default() -> Self {
        Self {
            card: None,
            status: SeatStatus::Active,
            result: None,
            war_card: None,
        }
    }
}

/// The shoe: undealt cards plus a pile of burned/discarded ones.
///
/// A fresh table has an empty shoe until the operator shuffles. After a
/// shuffle, the union of {undealt, discarded, cards on the table} is
/// always exactly one 52-card set.
#[derive(Debug, Default)]
pub struct Deck {
    cards: Vec<Card>,
    discards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    fn standard() -> Vec<Card> {
        let mut cards = Vec::with_capacity(52);
        for rank in Rank::ALL {
            for suit in Suit::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        cards
    }

    /// Replace the shoe with a freshly permuted full set, minus any cards
    /// currently on the table, and clear the discard pile.
    pub fn shuffle_fresh(&mut self, in_play: &[Card]) {
        let mut cards = Self::standard();
        for card in in_play {
            if let Some(pos) = cards.iter().position(|c| c == card) {
                cards.remove(pos);
            }
        }
        cards.shuffle(&mut rand::rng());
        self.cards = cards;
        self.discards.clear();
    }

    /// Remove and return the top card.
    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::DeckEmpty)
    }

    /// Draw the top card straight into the discard pile.
    pub fn burn(&mut self) -> Result<Card, GameError> {
        let card = self.draw()?;
        self.discards.push(card);
        Ok(card)
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Remove a specific card (manual assignment path).
    pub fn take(&mut self, card: Card) -> Result<(), GameError> {
        let pos = self
            .cards
            .iter()
            .position(|c| *c == card)
            .ok_or(GameError::CardNotInDeck(card))?;
        self.cards.remove(pos);
        Ok(())
    }

    /// Return a card to the top of the shoe (undo path).
    pub fn put_back(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Retire a card that left the table without going back to the shoe.
    pub fn discard(&mut self, card: Card) {
        self.discards.push(card);
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn burned(&self) -> usize {
        self.discards.len()
    }
}

/// Cards that caused a tie, frozen at war start for display.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OriginalCards {
    pub dealer_card: Option<Card>,
    pub players: BTreeMap<SeatId, Option<Card>>,
}

/// The overlay tracking a war sub-round: one slot for the dealer's war
/// card and one per tied, non-surrendered seat.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WarRound {
    pub dealer_card: Option<Card>,
    pub players: BTreeMap<SeatId, Option<Card>>,
    pub original_cards: OriginalCards,
}

impl WarRound {
    pub fn is_fully_assigned(&self) -> bool {
        self.dealer_card.is_some() && self.players.values().all(Option::is_some)
    }
}

/// The canonical full-state broadcast. Sufficient on its own for a client
/// to reconstruct its entire view.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub deck_count: usize,
    pub burned_count: usize,
    pub dealer_card: Option<Card>,
    pub players: BTreeMap<SeatId, Seat>,
    pub round_active: bool,
    pub round_number: u64,
    pub game_mode: GameMode,
    pub table_number: u32,
    pub min_bet: u32,
    pub max_bet: u32,
    pub player_results: BTreeMap<SeatId, Outcome>,
    pub war_round: Option<WarRound>,
}
