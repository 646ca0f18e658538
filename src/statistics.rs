//! Per-team counters.
//!
//! A [`Statistics`] is created for each team at the start of a match and updated by the
//! simulator only. The season layer folds match statistics together with
//! [`Statistics::add`] and ranks teams with [`Statistics::rank_cmp`] or [`standings`].

use std::{cmp::Ordering, fmt::Display, time::Duration};

use anyhow::{bail, Context};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Counters for one team, over one match or a whole season.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    team: String,
    /// Grass eaten by the sheep.
    pub grass_eaten: u32,
    /// Rhubarb eaten by the sheep.
    pub rhubarb_eaten: u32,
    /// Grass crushed by the wolf.
    pub grass_crushed: u32,
    /// Rhubarb crushed by the wolf.
    pub rhubarb_crushed: u32,
    /// Opposing sheep eaten by the wolf.
    pub sheep_eaten: u32,
    /// Matches won.
    pub games_won: u32,
    /// Matches lost.
    pub games_lost: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Whole seconds spent thinking.
    pub think_secs: u64,
    /// Sub-second remainder, always below one second.
    pub think_nanos: u32,
    /// Number of think steps.
    pub turns: u32,
    /// Grass present on the maps played.
    pub grass_total: u32,
    /// Rhubarb present on the maps played.
    pub rhubarb_total: u32,
    /// Matches lost by disqualification.
    pub disqualifications: u32,
}

impl Statistics {
    /// Empty statistics for `team`.
    pub fn new(team: impl Into<String>) -> Statistics {
        Statistics {
            team: team.into(),
            ..Default::default()
        }
    }

    /// Team these counters belong to.
    pub fn team(&self) -> &str {
        &self.team
    }

    /// Points scored from food: 5 per rhubarb, 1 per grass.
    pub fn points(&self) -> u32 {
        self.rhubarb_eaten * 5 + self.grass_eaten
    }

    /// Total think time.
    pub fn think_time(&self) -> Duration {
        Duration::new(self.think_secs, self.think_nanos)
    }

    /// Add `other` to `self`, field by field.
    pub fn add(&mut self, other: &Statistics) {
        self.grass_eaten += other.grass_eaten;
        self.rhubarb_eaten += other.rhubarb_eaten;
        self.grass_crushed += other.grass_crushed;
        self.rhubarb_crushed += other.rhubarb_crushed;
        self.sheep_eaten += other.sheep_eaten;
        self.games_won += other.games_won;
        self.games_lost += other.games_lost;
        self.draws += other.draws;
        self.turns += other.turns;
        self.grass_total += other.grass_total;
        self.rhubarb_total += other.rhubarb_total;
        self.disqualifications += other.disqualifications;

        self.think_secs += other.think_secs;
        self.add_nanos(u64::from(other.think_nanos));
    }

    fn add_nanos(&mut self, nanos: u64) {
        let total = u64::from(self.think_nanos) + nanos;
        self.think_secs += total / u64::from(NANOS_PER_SEC);
        self.think_nanos = (total % u64::from(NANOS_PER_SEC)) as u32;
    }

    /// Record one think step of `elapsed`.
    pub fn think(&mut self, elapsed: Duration) {
        self.think_secs += elapsed.as_secs();
        self.add_nanos(u64::from(elapsed.subsec_nanos()));
        self.turns += 1;
    }

    /// The sheep ate grass.
    pub fn eat_grass(&mut self) {
        self.grass_eaten += 1;
    }

    /// The sheep ate rhubarb.
    pub fn eat_rhubarb(&mut self) {
        self.rhubarb_eaten += 1;
    }

    /// The wolf walked over grass.
    pub fn crush_grass(&mut self) {
        self.grass_crushed += 1;
    }

    /// The wolf walked over rhubarb.
    pub fn crush_rhubarb(&mut self) {
        self.rhubarb_crushed += 1;
    }

    /// The wolf ate the opposing sheep.
    pub fn eat_sheep(&mut self) {
        self.sheep_eaten += 1;
    }

    /// Count a won match.
    pub fn win(&mut self) {
        self.games_won += 1;
    }

    /// Count a lost match.
    pub fn lose(&mut self) {
        self.games_lost += 1;
    }

    /// Count a drawn match.
    pub fn draw(&mut self) {
        self.draws += 1;
    }

    /// Flag these statistics as containing a disqualification.
    pub fn disqualify(&mut self) {
        self.disqualifications += 1;
    }

    /// Set the amount of food on the map of the match.
    pub fn set_totals(&mut self, grass: u32, rhubarb: u32) {
        self.grass_total = grass;
        self.rhubarb_total = rhubarb;
    }

    /// Compare ranks. `Greater` means `self` ranks above `other`.
    ///
    /// More wins first, then fewer losses, then more points, then more sheep eaten.
    pub fn rank_cmp(&self, other: &Statistics) -> Ordering {
        self.games_won
            .cmp(&other.games_won)
            .then_with(|| other.games_lost.cmp(&self.games_lost))
            .then_with(|| self.points().cmp(&other.points()))
            .then_with(|| self.sheep_eaten.cmp(&other.sheep_eaten))
    }

    /// One semicolon separated line (without line break):
    /// `team;won;lost;draws;grass_eaten;rhubarb_eaten;sheep_eaten;grass_crushed;`
    /// `rhubarb_crushed;grass_total;rhubarb_total;think_secs;think_nanos;turns;disqualifications`
    pub fn to_record(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{};{};{};{};{};{};{};{}",
            self.team,
            self.games_won,
            self.games_lost,
            self.draws,
            self.grass_eaten,
            self.rhubarb_eaten,
            self.sheep_eaten,
            self.grass_crushed,
            self.rhubarb_crushed,
            self.grass_total,
            self.rhubarb_total,
            self.think_secs,
            self.think_nanos,
            self.turns,
            self.disqualifications
        )
    }

    /// Parse a line written by [`Statistics::to_record`]. Lines without the trailing
    /// disqualification count are accepted.
    pub fn from_record(line: &str) -> anyhow::Result<Statistics> {
        let mut fields = line.trim_end().split(';');
        let team = fields.next().filter(|t| !t.is_empty()).context("missing team name")?;
        let values = fields
            .map(|f| {
                f.parse::<u64>()
                    .with_context(|| format!("invalid statistics field '{f}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if values.len() != 13 && values.len() != 14 {
            bail!("expected 13 or 14 statistics fields, got {}", values.len());
        }
        let field = |i: usize| -> anyhow::Result<u32> {
            u32::try_from(values[i]).with_context(|| format!("field {i} out of range"))
        };
        let think_nanos = field(11)?;
        if think_nanos >= NANOS_PER_SEC {
            bail!("think nanoseconds {think_nanos} exceed one second");
        }
        Ok(Statistics {
            team: team.to_owned(),
            games_won: field(0)?,
            games_lost: field(1)?,
            draws: field(2)?,
            grass_eaten: field(3)?,
            rhubarb_eaten: field(4)?,
            sheep_eaten: field(5)?,
            grass_crushed: field(6)?,
            rhubarb_crushed: field(7)?,
            grass_total: field(8)?,
            rhubarb_total: field(9)?,
            think_secs: values[10],
            think_nanos,
            turns: field(12)?,
            disqualifications: if values.len() == 14 { field(13)? } else { 0 },
        })
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:4}{:4}{:4} {}",
            self.games_won,
            self.games_lost,
            self.points(),
            self.team
        )
    }
}

/// Sort best ranked first.
pub fn standings(stats: &mut [Statistics]) {
    stats.sort_by(|a, b| b.rank_cmp(a));
}
