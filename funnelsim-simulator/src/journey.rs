//! # Journey simulation
//!
//! A single user's path through the funnel:
//!
//! ```text
//! arrival -> browsing -> [experiment assignment] -> signup -> onboarding -> purchase
//! ```
//!
//! Browsing always happens. Every later stage is a Bernoulli gate; failing
//! one ends the journey with whatever events were emitted so far. The order
//! in which draws are taken from the stream is part of the reproducibility
//! contract and must not change.

use chrono::{DateTime, Utc};
use funnelsim_ab::{assign_variant, Experiment, TREATMENT_VARIANT};
use funnelsim_config::SimulationConfig;
use funnelsim_core::{Event, EventType, Properties, PropertyValue};

use crate::clock::JourneyClock;
use crate::rng::SimRng;

const SECONDS_PER_DAY: u64 = 86_400;

// Inclusive gaps, in seconds, that follow or precede each kind of event.
const PAGE_VIEW_GAP: (u64, u64) = (5, 120);
const CLICK_GAP: (u64, u64) = (2, 30);
const ASSIGNMENT_DELAY: (u64, u64) = (1, 10);
const SIGNUP_DELAY: (u64, u64) = (10, 300);
const ONBOARDING_DELAY: (u64, u64) = (60, 3600);
const DASHBOARD_VIEWS: (u64, u64) = (2, 5);
const DASHBOARD_GAP: (u64, u64) = (10, 180);
const PURCHASE_DELAY: (u64, u64) = (30, 600);

const SIGNUP_SOURCE: &str = "web";

/// Simulates one user and returns their events in emission order.
///
/// `window_start` is the beginning of the arrival window; the user arrives
/// somewhere in `[window_start, window_start + config.days]`.
pub fn simulate_user_journey(
    user_id: &str,
    window_start: DateTime<Utc>,
    config: &SimulationConfig,
    rng: &mut SimRng,
    experiment: Option<&Experiment>,
) -> Vec<Event> {
    let arrival = rng.int_between(0, u64::from(config.days) * SECONDS_PER_DAY);
    let mut clock = JourneyClock::new(window_start);
    clock.advance_secs(arrival);

    let mut journey = Journey {
        user_id,
        rng,
        clock,
        events: Vec::new(),
    };

    // Browsing: no drop-off gate.
    let views = journey.draw(u64::from(config.min_page_views), u64::from(config.max_page_views));
    for _ in 0..views {
        let page = journey.rng.pick(&config.pages).cloned();
        journey.emit(EventType::PageView, optional("page", page));
        journey.pause(PAGE_VIEW_GAP);
    }

    let clicks = journey.draw(u64::from(config.min_clicks), u64::from(config.max_clicks));
    for _ in 0..clicks {
        let target = journey.rng.pick(&config.click_targets).cloned();
        journey.emit(EventType::Click, optional("target", target));
        journey.pause(CLICK_GAP);
    }

    let mut variant = None;
    if let Some(experiment) = experiment {
        let assigned = assign_variant(experiment, user_id);
        journey.pause(ASSIGNMENT_DELAY);
        journey.emit(
            EventType::ExperimentAssignment,
            properties([
                ("experiment_id", experiment.experiment_id().into()),
                ("variant", assigned.into()),
            ]),
        );
        variant = Some(assigned);
    }

    if !journey.rng.passes(config.prob_signup) {
        return journey.finish();
    }
    journey.pause(SIGNUP_DELAY);
    journey.emit(EventType::Signup, properties([("source", SIGNUP_SOURCE.into())]));

    if !journey.rng.passes(config.prob_onboarding) {
        return journey.finish();
    }
    journey.pause(ONBOARDING_DELAY);
    let dashboard_views = journey.draw(DASHBOARD_VIEWS.0, DASHBOARD_VIEWS.1);
    for _ in 0..dashboard_views {
        journey.emit(
            EventType::PageView,
            properties([("page", config.dashboard_page.as_str().into())]),
        );
        journey.pause(DASHBOARD_GAP);
    }

    let purchase_prob = purchase_probability(config, variant);
    if !journey.rng.passes(purchase_prob) {
        return journey.finish();
    }
    journey.pause(PURCHASE_DELAY);
    if let Some(plan) = journey.rng.weighted_pick(&config.plans, |p| p.weight) {
        journey.emit(
            EventType::Purchase,
            properties([
                ("plan", plan.name.as_str().into()),
                ("amount", plan.price.into()),
            ]),
        );
    }

    journey.finish()
}

/// `prob_purchase`, plus the uplift for treatment users, capped at 1.
pub fn purchase_probability(config: &SimulationConfig, variant: Option<&str>) -> f64 {
    if variant == Some(TREATMENT_VARIANT) {
        (config.prob_purchase + config.treatment_uplift).min(1.0)
    } else {
        config.prob_purchase
    }
}

struct Journey<'a> {
    user_id: &'a str,
    rng: &'a mut SimRng,
    clock: JourneyClock,
    events: Vec<Event>,
}

impl Journey<'_> {
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        self.rng.int_between(lo, hi)
    }

    fn pause(&mut self, (lo, hi): (u64, u64)) {
        let secs = self.rng.int_between(lo, hi);
        self.clock.advance_secs(secs);
    }

    /// The id is drawn here, at creation, from the shared stream.
    fn emit(&mut self, event_type: EventType, properties: Properties) {
        let event_id = self.rng.event_id();
        self.events.push(Event::new(
            event_id,
            self.user_id,
            event_type,
            self.clock.now(),
            properties,
        ));
    }

    fn finish(self) -> Vec<Event> {
        self.events
    }
}

fn properties<const N: usize>(pairs: [(&str, PropertyValue); N]) -> Properties {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn optional(key: &str, value: Option<String>) -> Properties {
    value
        .map(|v| properties([(key, v.into())]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use funnelsim_ab::{Variant, CONTROL_VARIANT, PRICING_PAGE_EXPERIMENT};

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn always_converts() -> SimulationConfig {
        SimulationConfig {
            prob_signup: 1.0,
            prob_onboarding: 1.0,
            prob_purchase: 1.0,
            ..Default::default()
        }
    }

    fn types(events: &[Event]) -> Vec<EventType> {
        events.iter().map(|e| e.event_type).collect()
    }

    /// Experiment whose every user lands in `variant`.
    fn pinned(variant: &str) -> Experiment {
        let other = if variant == CONTROL_VARIANT { "treatment" } else { "control" };
        Experiment::new(
            "exp_pinned",
            "Pinned",
            vec![Variant::new(variant, 1.0), Variant::new(other, 0.0)],
            "purchase",
        )
        .unwrap()
    }

    #[test]
    fn full_journey_shape() {
        let config = always_converts();
        let mut rng = SimRng::from_seed(42);
        let events = simulate_user_journey(
            "user_00000",
            window_start(),
            &config,
            &mut rng,
            Some(&PRICING_PAGE_EXPERIMENT),
        );

        let kinds = types(&events);
        let browse_views = kinds
            .iter()
            .take_while(|t| **t == EventType::PageView)
            .count();
        assert!((1..=8).contains(&browse_views));
        let clicks = kinds[browse_views..]
            .iter()
            .take_while(|t| **t == EventType::Click)
            .count();
        assert!(clicks <= 5);

        let rest = &kinds[browse_views + clicks..];
        assert_eq!(rest[0], EventType::ExperimentAssignment);
        assert_eq!(rest[1], EventType::Signup);
        assert_eq!(*rest.last().unwrap(), EventType::Purchase);
        let dashboard = &rest[2..rest.len() - 1];
        assert!((2..=5).contains(&dashboard.len()));
        assert!(dashboard.iter().all(|t| *t == EventType::PageView));

        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert!(events.iter().all(|e| e.user_id == "user_00000"));
    }

    #[test]
    fn browse_pages_come_from_catalog() {
        let config = always_converts();
        let mut rng = SimRng::from_seed(5);
        let events = simulate_user_journey("user_00001", window_start(), &config, &mut rng, None);

        for event in events.iter().filter(|e| e.event_type == EventType::PageView) {
            let page = event.text("page").expect("page property");
            assert!(config.pages.iter().any(|p| p == page) || page == config.dashboard_page);
        }
        let dashboard_views = events
            .iter()
            .filter(|e| e.text("page") == Some("/dashboard"))
            .count();
        assert!((2..=5).contains(&dashboard_views));
    }

    #[test]
    fn arrival_within_window() {
        let config = SimulationConfig {
            days: 2,
            ..Default::default()
        };
        let mut rng = SimRng::from_seed(11);
        for i in 0..200 {
            let events = simulate_user_journey(
                &format!("user_{:05}", i),
                window_start(),
                &config,
                &mut rng,
                None,
            );
            let first = events[0].timestamp;
            assert!(first >= window_start());
            assert!(first <= window_start() + TimeDelta::days(2));
        }
    }

    #[test]
    fn no_experiment_no_assignment() {
        let config = always_converts();
        let mut rng = SimRng::from_seed(8);
        let events = simulate_user_journey("user_00002", window_start(), &config, &mut rng, None);
        assert!(!types(&events).contains(&EventType::ExperimentAssignment));
    }

    #[test]
    fn signup_gate_drop_off() {
        let config = SimulationConfig {
            prob_signup: 0.0,
            ..Default::default()
        };
        let mut rng = SimRng::from_seed(9);
        let events = simulate_user_journey(
            "user_00003",
            window_start(),
            &config,
            &mut rng,
            Some(&PRICING_PAGE_EXPERIMENT),
        );
        assert_eq!(*types(&events).last().unwrap(), EventType::ExperimentAssignment);
        assert!(!types(&events).contains(&EventType::Signup));
    }

    #[test]
    fn onboarding_gate_drop_off() {
        let config = SimulationConfig {
            prob_signup: 1.0,
            prob_onboarding: 0.0,
            ..Default::default()
        };
        let mut rng = SimRng::from_seed(10);
        let events = simulate_user_journey("user_00004", window_start(), &config, &mut rng, None);
        assert_eq!(*types(&events).last().unwrap(), EventType::Signup);
        assert_eq!(events.last().unwrap().text("source"), Some("web"));
    }

    #[test]
    fn uplift_applies_only_to_treatment() {
        let config = SimulationConfig {
            prob_signup: 1.0,
            prob_onboarding: 1.0,
            prob_purchase: 0.0,
            treatment_uplift: 1.0,
            ..Default::default()
        };
        let treatment = pinned("treatment");
        let control = pinned("control");
        let mut rng = SimRng::from_seed(12);

        for i in 0..50 {
            let uid = format!("user_{:05}", i);
            let t = simulate_user_journey(&uid, window_start(), &config, &mut rng, Some(&treatment));
            assert_eq!(t.last().unwrap().event_type, EventType::Purchase);
            let c = simulate_user_journey(&uid, window_start(), &config, &mut rng, Some(&control));
            assert!(!types(&c).contains(&EventType::Purchase));
        }
    }

    #[test]
    fn purchase_probability_is_capped() {
        let config = SimulationConfig {
            prob_purchase: 0.9,
            treatment_uplift: 0.5,
            ..Default::default()
        };
        assert_eq!(purchase_probability(&config, Some("treatment")), 1.0);
        assert_eq!(purchase_probability(&config, Some("control")), 0.9);
        assert_eq!(purchase_probability(&config, None), 0.9);
    }

    #[test]
    fn purchase_carries_plan_and_amount() {
        let config = always_converts();
        let mut rng = SimRng::from_seed(13);
        let events = simulate_user_journey("user_00005", window_start(), &config, &mut rng, None);
        let purchase = events.last().unwrap();
        assert_eq!(purchase.event_type, EventType::Purchase);
        let plan = purchase.text("plan").unwrap();
        let amount = purchase.property("amount").and_then(|v| v.as_f64()).unwrap();
        let expected = config.plans.iter().find(|p| p.name == plan).unwrap();
        assert_eq!(amount, expected.price);
    }

    #[test]
    fn shared_stream_advances_between_users() {
        let config = SimulationConfig::default();
        let mut rng = SimRng::from_seed(21);
        let a = simulate_user_journey("user_00000", window_start(), &config, &mut rng, None);
        let b = simulate_user_journey("user_00000", window_start(), &config, &mut rng, None);
        assert_ne!(a[0].event_id, b[0].event_id);
    }
}
