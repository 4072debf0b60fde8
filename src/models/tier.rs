use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ranked ladder tiers, lowest first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

/// Division inside a tier, lowest first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    #[serde(rename = "IV")]
    Four,
    #[serde(rename = "III")]
    Three,
    #[serde(rename = "II")]
    Two,
    #[serde(rename = "I")]
    One,
}

impl Tier {
    /// Master and above have no divisions; only league points separate players.
    pub fn is_apex(self) -> bool {
        self >= Tier::Master
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Iron => "Iron",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Emerald => "Emerald",
            Tier::Diamond => "Diamond",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
            Tier::Challenger => "Challenger",
        }
    }

    /// Rough tier guess from a ladder score.
    pub fn estimate_from_score(score: i32) -> Tier {
        match score {
            s if s >= 2400 => Tier::Challenger,
            s if s >= 2200 => Tier::Grandmaster,
            s if s >= 2000 => Tier::Master,
            s if s >= 1800 => Tier::Diamond,
            s if s >= 1600 => Tier::Emerald,
            s if s >= 1400 => Tier::Platinum,
            s if s >= 1200 => Tier::Gold,
            s if s >= 1000 => Tier::Silver,
            s if s >= 800 => Tier::Bronze,
            _ => Tier::Iron,
        }
    }
}

impl Rank {
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Four => "IV",
            Rank::Three => "III",
            Rank::Two => "II",
            Rank::One => "I",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player's ladder standing, comparable across tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub tier: Tier,
    pub rank: Option<Rank>,
    pub league_points: i32,
}

impl Standing {
    pub fn new(tier: Tier, rank: Option<Rank>, league_points: i32) -> Self {
        Self {
            tier,
            rank,
            league_points,
        }
    }
}

impl Ord for Standing {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier.cmp(&other.tier).then_with(|| {
            if self.tier.is_apex() {
                return self.league_points.cmp(&other.league_points);
            }
            let by_rank = match (self.rank, other.rank) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            };
            by_rank.then_with(|| self.league_points.cmp(&other.league_points))
        })
    }
}

impl PartialOrd for Standing {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tier.is_apex() {
            return write!(f, "{} {}LP", self.tier, self.league_points);
        }
        match self.rank {
            Some(rank) => write!(f, "{} {}", self.tier, rank),
            None => write!(f, "{}", self.tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_tier_wins_regardless_of_points() {
        let gold = Standing::new(Tier::Gold, Some(Rank::One), 99);
        let plat = Standing::new(Tier::Platinum, Some(Rank::Four), 0);
        assert!(plat > gold);
    }

    #[test]
    fn rank_then_points_inside_a_tier() {
        let a = Standing::new(Tier::Silver, Some(Rank::Two), 10);
        let b = Standing::new(Tier::Silver, Some(Rank::Three), 90);
        let c = Standing::new(Tier::Silver, Some(Rank::Two), 50);
        assert!(a > b);
        assert!(c > a);
    }

    #[test]
    fn apex_tiers_compare_points_only() {
        let a = Standing::new(Tier::Master, Some(Rank::One), 100);
        let b = Standing::new(Tier::Master, Some(Rank::Four), 300);
        assert!(b > a);
    }

    #[test]
    fn display_strings() {
        assert_eq!(Standing::new(Tier::Gold, Some(Rank::Three), 12).to_string(), "Gold III");
        assert_eq!(Standing::new(Tier::Gold, None, 12).to_string(), "Gold");
        assert_eq!(
            Standing::new(Tier::Challenger, Some(Rank::One), 812).to_string(),
            "Challenger 812LP"
        );
    }

    #[test]
    fn estimate_thresholds() {
        assert_eq!(Tier::estimate_from_score(0), Tier::Iron);
        assert_eq!(Tier::estimate_from_score(800), Tier::Bronze);
        assert_eq!(Tier::estimate_from_score(1399), Tier::Gold);
        assert_eq!(Tier::estimate_from_score(2400), Tier::Challenger);
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Tier::Grandmaster).unwrap(), "\"GRANDMASTER\"");
        assert_eq!(serde_json::from_str::<Rank>("\"IV\"").unwrap(), Rank::Four);
    }
}
