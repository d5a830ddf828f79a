use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// Upper bounds of the cumulative rarity distribution, in tier order.
/// Anything at or above the last bound is legendary.
pub const COMMON_UPPER: f64 = 0.5;
pub const RARE_UPPER: f64 = 0.8;
pub const EPIC_UPPER: f64 = 0.95;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Map a uniform draw in `[0, 1)` onto a tier.
    pub fn from_draw(draw: f64) -> Self {
        if draw < COMMON_UPPER {
            Rarity::Common
        } else if draw < RARE_UPPER {
            Rarity::Rare
        } else if draw < EPIC_UPPER {
            Rarity::Epic
        } else {
            Rarity::Legendary
        }
    }

    /// Nominal probability of the tier.
    pub fn probability(self) -> f64 {
        match self {
            Rarity::Common => COMMON_UPPER,
            Rarity::Rare => RARE_UPPER - COMMON_UPPER,
            Rarity::Epic => EPIC_UPPER - RARE_UPPER,
            Rarity::Legendary => 1.0 - EPIC_UPPER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::draw::{
        DrawSource,
        RngDraws,
    };

    #[test]
    fn from_draw__maps_bucket_edges_to_expected_tiers() {
        // given
        let cases = [
            (0.0, Rarity::Common),
            (0.4999, Rarity::Common),
            (0.5, Rarity::Rare),
            (0.7999, Rarity::Rare),
            (0.8, Rarity::Epic),
            (0.9499, Rarity::Epic),
            (0.95, Rarity::Legendary),
            (0.9999, Rarity::Legendary),
        ];

        for (draw, expected) in cases {
            // when
            let actual = Rarity::from_draw(draw);

            // then
            assert_eq!(actual, expected, "draw {draw}");
        }
    }

    #[test]
    fn from_draw__converges_to_nominal_distribution() {
        // given
        const SAMPLES: usize = 100_000;
        const TOLERANCE: f64 = 0.01;
        let mut draws = RngDraws::seeded(7);
        let mut counts = [0usize; 4];

        // when
        for _ in 0..SAMPLES {
            let rarity = Rarity::from_draw(draws.unit());
            counts[rarity as usize] += 1;
        }

        // then
        for rarity in Rarity::ALL {
            let observed = counts[rarity as usize] as f64 / SAMPLES as f64;
            let expected = rarity.probability();
            assert!(
                (observed - expected).abs() < TOLERANCE,
                "{rarity}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn ordering__follows_tier_order() {
        assert!(Rarity::Common < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Epic);
        assert!(Rarity::Epic < Rarity::Legendary);
    }
}
