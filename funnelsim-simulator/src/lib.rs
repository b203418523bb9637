// funnelsim-simulator/src/lib.rs

/*!
# funnelsim Simulator

Deterministic generator of synthetic product-analytics events. A run walks
a population of users through the signup funnel on one seeded random
stream, so the same seed, configuration and window produce the same events.

## Key Components:
- **Seeded Stream:** MT19937-backed `SimRng` shared by every user in a run.
- **Journey Clock:** Per-user simulated time, advanced by drawn pauses.
- **Journey:** The arrival, browsing, assignment, signup, onboarding and purchase stages.
- **Driver:** Population loop, timestamp ordering and the `Simulator` handle.
- **Summary:** Event breakdown, per-variant conversion and a BLAKE3 run digest.
*/

pub mod clock;
pub mod driver;
pub mod journey;
pub mod rng;
pub mod summary;

pub use driver::{
    default_window_end, generate_events, generate_events_until, user_id, Simulator,
};
pub use journey::{purchase_probability, simulate_user_journey};
pub use rng::SimRng;
pub use summary::{run_digest, RunSummary, VariantStats};
