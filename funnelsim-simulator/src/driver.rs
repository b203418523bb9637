//! Simulation driver.
//!
//! Runs the journey simulator over the whole population with one shared
//! random stream, then stable-sorts the merged events by timestamp. Users
//! are processed strictly in index order; any reordering would change
//! which draws each user consumes.

use chrono::{DateTime, TimeDelta, Utc};
use funnelsim_ab::Experiment;
use funnelsim_config::SimulationConfig;
use funnelsim_core::Event;
use tracing::{info, instrument, trace};

use crate::journey::simulate_user_journey;
use crate::rng::SimRng;

/// Zero-padded user id for population index `index`.
pub fn user_id(index: usize) -> String {
    format!("user_{:05}", index)
}

/// The simulation window ends one day before now, keeping every
/// timestamp in the past even after a journey's in-session time.
pub fn default_window_end() -> DateTime<Utc> {
    Utc::now() - TimeDelta::days(1)
}

/// Generates all events for a run ending at [`default_window_end`].
pub fn generate_events(config: &SimulationConfig, experiment: Option<&Experiment>) -> Vec<Event> {
    generate_events_until(config, experiment, default_window_end())
}

/// Generates all events for a run whose arrival window ends at `window_end`.
///
/// Two calls with the same config, experiment and `window_end` return
/// identical sequences.
pub fn generate_events_until(
    config: &SimulationConfig,
    experiment: Option<&Experiment>,
    window_end: DateTime<Utc>,
) -> Vec<Event> {
    Simulator::new(config, experiment).run_until(window_end)
}

/// Step-wise access to a run: owns the stream, borrows the inputs.
pub struct Simulator<'a> {
    config: &'a SimulationConfig,
    experiment: Option<&'a Experiment>,
    rng: SimRng,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a SimulationConfig, experiment: Option<&'a Experiment>) -> Self {
        Self {
            config,
            experiment,
            rng: SimRng::from_seed(config.seed),
        }
    }

    /// Simulates the next user on the shared stream.
    pub fn simulate_user(&mut self, user_id: &str, window_start: DateTime<Utc>) -> Vec<Event> {
        simulate_user_journey(
            user_id,
            window_start,
            self.config,
            &mut self.rng,
            self.experiment,
        )
    }

    /// Runs the whole population and returns events sorted by timestamp.
    #[instrument(
        level = "info",
        name = "generate_events",
        skip_all,
        fields(
            seed = self.config.seed,
            users = self.config.num_users,
            days = self.config.days,
            experiment = self.experiment.map(|e| e.experiment_id()).unwrap_or("none"),
        )
    )]
    pub fn run_until(mut self, window_end: DateTime<Utc>) -> Vec<Event> {
        let window_start = window_end - TimeDelta::days(i64::from(self.config.days));
        info!(%window_start, %window_end, "Starting simulation");

        let mut events = Vec::new();
        for index in 0..self.config.num_users {
            let uid = user_id(index);
            let journey = self.simulate_user(&uid, window_start);
            trace!(user = %uid, events = journey.len(), "Journey complete");
            events.extend(journey);
        }

        // Stable: events of one user keep their emission order on ties.
        events.sort_by_key(|e| e.timestamp);
        info!(events = events.len(), "Simulation complete");
        events
    }

    pub fn run(self) -> Vec<Event> {
        self.run_until(default_window_end())
    }
}
