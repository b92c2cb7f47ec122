//! Runs both propagators over the same interval and reports the results

use std::fmt;
use std::time::{Duration, Instant as WallClock};

use satkit::Duration as Span;

use crate::builder::{build_dsst, build_numerical, Environment};
use crate::config::{ComparisonSettings, DSST_PROPAGATOR, NUMERICAL_PROPAGATOR};
use crate::data::DataContext;
use crate::error::Result;
use crate::propagation::state::SpacecraftState;

/// Final state of one propagator and the time it took
#[derive(Debug, Clone)]
pub struct PropagationRun {
    pub propagator: &'static str,
    pub elapsed: Duration,
    pub state: SpacecraftState,
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub numerical: PropagationRun,
    pub dsst: PropagationRun,
}

impl ComparisonReport {
    /// Distance between the two final positions (m)
    pub fn position_difference(&self) -> f64 {
        (self.numerical.state.orbit.position() - self.dsst.state.orbit.position()).norm()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Numerical wall clock run time (s): {}", self.numerical.elapsed.as_secs_f64())?;
        writeln!(f, "{}", self.numerical.state)?;
        writeln!(f)?;
        writeln!(f, "DSST wall clock run time (s): {}", self.dsst.elapsed.as_secs_f64())?;
        write!(f, "{}", self.dsst.state)
    }
}

pub struct OrbitComparator {
    settings: ComparisonSettings,
    data: DataContext,
}

impl OrbitComparator {
    pub fn new(settings: ComparisonSettings, data: DataContext) -> Self {
        Self { settings, data }
    }

    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    /// Build both propagators, then run them one after the other
    ///
    /// Only the propagation itself is timed. The first failure aborts the
    /// comparison.
    pub fn run(&self) -> Result<ComparisonReport> {
        let environment = Environment::build(&self.settings, &self.data)?;
        let numerical = build_numerical(&self.settings, &environment)?;
        let dsst = build_dsst(&self.settings, &environment)?;

        let target = environment.initial_orbit.date() + Span::from_seconds(self.settings.duration);
        log::info!(
            "Propagating {:.1} s from {}",
            self.settings.duration,
            crate::propagation::state::format_date(&environment.initial_orbit.date())
        );

        let start = WallClock::now();
        let state = numerical.propagate(&target)?;
        let numerical = PropagationRun {
            propagator: NUMERICAL_PROPAGATOR,
            elapsed: start.elapsed(),
            state,
        };
        log::debug!("{} done in {:?}", NUMERICAL_PROPAGATOR, numerical.elapsed);

        let start = WallClock::now();
        let state = dsst.propagate(&target)?;
        let dsst = PropagationRun {
            propagator: DSST_PROPAGATOR,
            elapsed: start.elapsed(),
            state,
        };
        log::debug!("{} done in {:?}", DSST_PROPAGATOR, dsst.elapsed);

        let report = ComparisonReport { numerical, dsst };
        log::info!("Final position difference: {:.3} m", report.position_difference());
        Ok(report)
    }
}
