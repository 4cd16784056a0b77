//! Value Objects for the poster shop

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal, system-generated product identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    pub fn new() -> Self { Self(Uuid::now_v7()) }
    pub fn from_uuid(id: Uuid) -> Self { Self(id) }
    pub fn as_uuid(&self) -> Uuid { self.0 }

    /// Parses the internal id format; anything else is not an internal id.
    pub fn parse(raw: &str) -> Option<Self> { Uuid::parse_str(raw).ok().map(Self) }
}

impl Default for ProductId { fn default() -> Self { Self::new() } }

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self { Self(Uuid::now_v7()) }
    pub fn from_uuid(id: Uuid) -> Self { Self(id) }
    pub fn as_uuid(&self) -> Uuid { self.0 }
    pub fn parse(raw: &str) -> Option<Self> { Uuid::parse_str(raw).ok().map(Self) }
}

impl Default for OrderId { fn default() -> Self { Self::new() } }

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Owning user reference, taken verbatim from the token subject
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Non-negative monetary amount in the store currency, at most two decimal
/// places and no larger than [`Money::max`].
///
/// Serialized as a JSON number; out-of-range amounts are rejected on
/// construction and on deserialization. Arithmetic is checked and yields
/// `None` instead of leaving that range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

/// Same bounds as the `NUMERIC(12, 2)` price column.
const MONEY_SCALE: u32 = 2;
const MAX_CENTS: i64 = 999_999_999_999;

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO { return Err(MoneyError::Negative(amount)); }
        let amount = amount.normalize();
        if amount.scale() > MONEY_SCALE { return Err(MoneyError::TooPrecise(amount)); }
        if amount > Self::max().0 { return Err(MoneyError::TooLarge(amount)); }
        Ok(Self(amount))
    }
    pub fn max() -> Money { Money(Decimal::new(MAX_CENTS, MONEY_SCALE)) }
    pub fn whole(units: u32) -> Self { Self(Decimal::from(units)) }
    pub fn from_cents(cents: u32) -> Self { Self(Decimal::new(i64::from(cents), MONEY_SCALE)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    pub fn checked_mul(&self, qty: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).and_then(Self::bounded)
    }

    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).and_then(Self::bounded)
    }

    fn bounded(amount: Decimal) -> Option<Money> {
        (amount <= Self::max().0).then_some(Money(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::new(amount).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must not be negative (got {0})")]
    Negative(Decimal),
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),
    #[error("amount {0} exceeds the maximum of 9999999999.99")]
    TooLarge(Decimal),
}

/// Line-item quantity, always at least one
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 { return Err(QuantityError::NotPositive(value)); }
        u32::try_from(value).map(Self).map_err(|_| QuantityError::TooLarge(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> { Quantity::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must be a positive integer (got {0})")]
    NotPositive(i64),
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// Fixed set of poster categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Abstract,
    Anime,
    Art,
    Gaming,
    Movies,
    Music,
    Nature,
    Sports,
    Vintage,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Abstract, Category::Anime, Category::Art, Category::Gaming, Category::Movies,
        Category::Music, Category::Nature, Category::Sports, Category::Vintage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Anime => "anime",
            Self::Art => "art",
            Self::Gaming => "gaming",
            Self::Movies => "movies",
            Self::Music => "music",
            Self::Nature => "nature",
            Self::Sports => "sports",
            Self::Vintage => "vintage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rejects_negative() {
        assert!(Money::new(Decimal::new(-1, 0)).is_err());
        assert_eq!(Money::new(Decimal::ZERO).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_money_add_and_multiply() {
        let total = Money::whole(10).checked_mul(2).and_then(|m| m.checked_add(Money::whole(25)));
        assert_eq!(total, Some(Money::whole(45)));
        assert_eq!(Money::from_cents(1999).amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_money_json_is_a_number() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1050)).unwrap(), "10.5");
        let m: Money = serde_json::from_str("12.25").unwrap();
        assert_eq!(m, Money::from_cents(1225));
        assert!(serde_json::from_str::<Money>("-3").is_err());
    }

    #[test]
    fn test_money_matches_price_column_bounds() {
        assert_eq!(Money::new(Decimal::new(10500, 3)).unwrap(), Money::from_cents(1050));
        assert_eq!(Money::new(Decimal::new(10005, 3)), Err(MoneyError::TooPrecise(Decimal::new(10005, 3))));
        assert!(serde_json::from_str::<Money>("10.005").is_err());
        assert_eq!(Money::new(Money::max().amount()).unwrap(), Money::max());
        assert!(matches!(Money::new(Decimal::new(10_000_000_000, 0)), Err(MoneyError::TooLarge(_))));
        assert!(serde_json::from_str::<Money>("50000000000000000000000000000").is_err());
    }

    #[test]
    fn test_money_arithmetic_is_checked() {
        let big = Money::new(Decimal::new(6_000_000_000, 0)).unwrap();
        assert_eq!(big.checked_mul(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::max().checked_mul(u32::MAX), None);
        assert_eq!(Money::max().checked_add(Money::ZERO), Some(Money::max()));
    }

    #[test]
    fn test_quantity() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-4).is_err());
        assert_eq!(Quantity::new(3).unwrap().add(Quantity::ONE).value(), 4);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Movies".parse::<Category>().unwrap(), Category::Movies);
        assert!("furniture".parse::<Category>().is_err());
    }

    #[test]
    fn test_product_id_parse() {
        let id = ProductId::new();
        assert_eq!(ProductId::parse(&id.to_string()), Some(id));
        assert_eq!(ProductId::parse("abc123"), None);
    }
}
