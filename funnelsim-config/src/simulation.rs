//! Simulation parameters.
//!
//! Defaults model a typical B2B SaaS signup funnel:
//! landing page -> signup -> onboarding -> purchase.
//! Stage probabilities are conditional on reaching the previous stage.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;
use crate::validation;

/// Everything that, together with the seed, determines a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of synthetic users.
    pub num_users: usize,

    /// Length of the arrival window in days.
    #[validate(range(min = 1, max = 3650))]
    pub days: u32,

    /// Seed for the shared random stream.
    pub seed: u64,

    /// P(signup | arrived).
    #[validate(range(min = 0.0, max = 1.0))]
    pub prob_signup: f64,

    /// P(onboarding | signup).
    #[validate(range(min = 0.0, max = 1.0))]
    pub prob_onboarding: f64,

    /// P(purchase | onboarding).
    #[validate(range(min = 0.0, max = 1.0))]
    pub prob_purchase: f64,

    /// Added to `prob_purchase` for users in the treatment variant.
    #[validate(range(min = 0.0, max = 1.0))]
    pub treatment_uplift: f64,

    pub min_page_views: u32,
    pub max_page_views: u32,
    pub min_clicks: u32,
    pub max_clicks: u32,

    /// Pages visited while browsing, picked uniformly.
    #[validate(length(min = 1))]
    #[validate(custom(function = validation::validate_catalog))]
    pub pages: Vec<String>,

    /// Clickable elements, picked uniformly.
    #[validate(length(min = 1))]
    #[validate(custom(function = validation::validate_catalog))]
    pub click_targets: Vec<String>,

    /// Page tag of post-onboarding views.
    #[validate(length(min = 1))]
    pub dashboard_page: String,

    /// Pricing plans, picked by weight.
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub plans: Vec<PlanConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_users: 2000,
            days: 14,
            seed: 42,
            prob_signup: 0.30,
            prob_onboarding: 0.70,
            prob_purchase: 0.15,
            treatment_uplift: 0.08,
            min_page_views: 1,
            max_page_views: 8,
            min_clicks: 0,
            max_clicks: 5,
            pages: ["/", "/features", "/pricing", "/docs", "/blog", "/about"]
                .map(String::from)
                .to_vec(),
            click_targets: [
                "cta_hero",
                "cta_pricing",
                "nav_features",
                "nav_docs",
                "footer_signup",
            ]
            .map(String::from)
            .to_vec(),
            dashboard_page: "/dashboard".into(),
            plans: vec![
                PlanConfig::new("starter", 29.0, 0.6),
                PlanConfig::new("pro", 99.0, 0.3),
                PlanConfig::new("enterprise", 299.0, 0.1),
            ],
        }
    }
}

impl SimulationConfig {
    /// Field validation plus the cross-field checks validator can't express.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        check_range("page_views", self.min_page_views, self.max_page_views)?;
        check_range("clicks", self.min_clicks, self.max_clicks)?;
        Ok(())
    }
}

fn check_range(field: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvalidRange { field, min, max });
    }
    Ok(())
}

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlanConfig {
    #[validate(length(min = 1))]
    pub name: String,

    /// Price charged on purchase.
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,

    /// Relative selection weight; need not sum to 1.
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
}

impl PlanConfig {
    pub fn new(name: impl Into<String>, price: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            price,
            weight,
        }
    }
}
