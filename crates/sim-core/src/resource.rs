//! Resources and per-resource maps.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Minable, tradable resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Blue gems.
    BlueGems,
    /// Red rubies.
    RedRubies,
    /// White diamonds.
    WhiteDiamonds,
    /// Green poison, burned as raid fuel by default.
    GreenPoison,
}

impl Resource {
    /// Every resource in canonical iteration order.
    pub const ALL: [Resource; 4] = [
        Resource::BlueGems,
        Resource::RedRubies,
        Resource::WhiteDiamonds,
        Resource::GreenPoison,
    ];

    /// Stable lowercase name used in news and serialized state.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::BlueGems => "bluegems",
            Resource::RedRubies => "redrubies",
            Resource::WhiteDiamonds => "whitediamonds",
            Resource::GreenPoison => "greenpoison",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown resource name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource: {0}")]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}

/// Total map from every [`Resource`] to a value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct ResourceMap<T> {
    pub bluegems: T,
    pub redrubies: T,
    pub whitediamonds: T,
    pub greenpoison: T,
}

impl<T> ResourceMap<T> {
    /// Build a map by evaluating `f` once per resource, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Resource) -> T) -> Self {
        Self {
            bluegems: f(Resource::BlueGems),
            redrubies: f(Resource::RedRubies),
            whitediamonds: f(Resource::WhiteDiamonds),
            greenpoison: f(Resource::GreenPoison),
        }
    }

    /// Iterate `(resource, &value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &T)> {
        Resource::ALL.into_iter().map(move |r| (r, &self[r]))
    }

    /// Apply `f` to every value.
    pub fn map<U>(&self, mut f: impl FnMut(Resource, &T) -> U) -> ResourceMap<U> {
        ResourceMap::from_fn(|r| f(r, &self[r]))
    }
}

impl<T: Clone> ResourceMap<T> {
    /// Map with the same value for every resource.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl ResourceMap<Decimal> {
    /// Sum of all values.
    pub fn total(&self) -> Decimal {
        self.iter().map(|(_, v)| *v).sum()
    }
}

impl ResourceMap<u32> {
    /// Sum of all values, saturating.
    pub fn total(&self) -> u32 {
        self.iter().fold(0u32, |acc, (_, v)| acc.saturating_add(*v))
    }
}

impl<T> Index<Resource> for ResourceMap<T> {
    type Output = T;

    fn index(&self, r: Resource) -> &T {
        match r {
            Resource::BlueGems => &self.bluegems,
            Resource::RedRubies => &self.redrubies,
            Resource::WhiteDiamonds => &self.whitediamonds,
            Resource::GreenPoison => &self.greenpoison,
        }
    }
}

impl<T> IndexMut<Resource> for ResourceMap<T> {
    fn index_mut(&mut self, r: Resource) -> &mut T {
        match r {
            Resource::BlueGems => &mut self.bluegems,
            Resource::RedRubies => &mut self.redrubies,
            Resource::WhiteDiamonds => &mut self.whitediamonds,
            Resource::GreenPoison => &mut self.greenpoison,
        }
    }
}

/// Round down to `scale` decimal places (0 = whole units).
pub fn floor_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::ToNegativeInfinity)
}

/// Round half away from zero to `scale` decimal places.
pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp `requested` into `[0, available]`.
pub fn clamp_quantity(requested: Decimal, available: Decimal) -> Decimal {
    requested.max(Decimal::ZERO).min(available.max(Decimal::ZERO))
}
