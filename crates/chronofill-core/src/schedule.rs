//! Random planning of commit counts, commit times and throttle delays.
//!
//! [`RandomScheduler`] draws from an injected [`RandomSource`], so a run can
//! be made reproducible by seeding [`StdRandom`] or replayed exactly with a
//! scripted source in tests.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fewest commits a single day can receive.
pub const MIN_COMMITS_PER_DAY: u32 = 5;
/// Most commits a single day can receive.
pub const MAX_COMMITS_PER_DAY: u32 = 10;
/// Shortest pause between pull-request events, in milliseconds.
pub const MIN_DELAY_MS: u32 = 200;
/// Longest pause between pull-request events, in milliseconds.
pub const MAX_DELAY_MS: u32 = 800;
/// Exclusive upper bound of the random branch-name suffix.
pub const BRANCH_SUFFIX_BOUND: u32 = 1_000_000;

/// Source of uniformly distributed integers.
pub trait RandomSource: Send {
    /// Draw an integer in `[low, high]`, both inclusive.
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32;
}

/// [`RandomSource`] backed by the standard seedable RNG.
#[derive(Debug, Clone)]
pub struct StdRandom(StdRng);

impl StdRandom {
    /// RNG seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        StdRandom(StdRng::from_entropy())
    }

    /// RNG with a fixed seed; identical seeds replay identical plans.
    pub fn seeded(seed: u64) -> Self {
        StdRandom(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for StdRandom {
    fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.0.gen_range(low..=high)
    }
}

/// Timezone in which times of day are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleZone {
    /// The host's local timezone.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

/// Draws per-day commit counts, times of day, and inter-request delays.
pub struct RandomScheduler {
    source: Box<dyn RandomSource>,
}

impl RandomScheduler {
    pub fn new(source: impl RandomSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Number of commits for one day, uniform in `[5, 10]`.
    pub fn plan_day(&mut self) -> u32 {
        self.source
            .int_inclusive(MIN_COMMITS_PER_DAY, MAX_COMMITS_PER_DAY)
    }

    /// A random second of `day`, expressed in `tz`.
    ///
    /// Hour, minute and second are drawn independently in that order. A
    /// local time skipped by a DST transition is moved one hour later, which
    /// keeps it on the same calendar day.
    pub fn plan_time<Tz: TimeZone>(&mut self, day: NaiveDate, tz: &Tz) -> DateTime<Tz> {
        let hour = self.source.int_inclusive(0, 23);
        let minute = self.source.int_inclusive(0, 59);
        let second = self.source.int_inclusive(0, 59);

        let time = NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN);
        let naive = day.and_time(time);

        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
                    .earliest()
            })
            .unwrap_or_else(|| tz.from_utc_datetime(&naive))
    }

    /// [`plan_time`](Self::plan_time) in `zone`, normalised to a fixed offset.
    pub fn plan_event_time(&mut self, day: NaiveDate, zone: ScheduleZone) -> DateTime<FixedOffset> {
        match zone {
            ScheduleZone::Local => fixed(self.plan_time(day, &Local)),
            ScheduleZone::Utc => fixed(self.plan_time(day, &Utc)),
            ScheduleZone::Fixed(offset) => self.plan_time(day, &offset),
        }
    }

    /// Pause inserted after each pull-request event, uniform in `[200, 800]` ms.
    pub fn plan_delay(&mut self) -> Duration {
        let ms = self.source.int_inclusive(MIN_DELAY_MS, MAX_DELAY_MS);
        Duration::from_millis(u64::from(ms))
    }

    /// Random branch-name suffix in `[0, 1_000_000)`.
    pub fn plan_branch_suffix(&mut self) -> u32 {
        self.source.int_inclusive(0, BRANCH_SUFFIX_BOUND - 1)
    }
}

fn fixed<Tz: TimeZone>(ts: DateTime<Tz>) -> DateTime<FixedOffset> {
    let offset = ts.offset().fix();
    ts.with_timezone(&offset)
}

impl std::fmt::Debug for RandomScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomScheduler").finish_non_exhaustive()
    }
}
