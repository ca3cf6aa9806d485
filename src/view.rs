//! Form state and result display for one user session

use std::fmt;

use crate::advisor::Advisor;
use crate::error::{AgriError, Result};
use crate::models::{FormInput, Recommendation};

pub const FALLBACK_ERROR: &str = "Failed to fetch recommendations";
pub const EMPTY_MESSAGE: &str = "No recommendations yet. Fill the form and submit.";
pub const SUBMIT_LABEL: &str = "Get Recommendation";
pub const SUBMIT_LABEL_BUSY: &str = "Analyzing…";

/// What the results area shows, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Cards(&'a [Recommendation]),
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Display::Loading => f.write_str(SUBMIT_LABEL_BUSY),
            Display::Error(message) => write!(f, "Error: {}", message),
            Display::Empty => f.write_str(EMPTY_MESSAGE),
            Display::Cards(recs) => {
                for (i, rec) in recs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n\n")?;
                    }
                    write!(f, "{}", rec)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationView {
    form: FormInput,
    recommendations: Option<Vec<Recommendation>>,
    loading: bool,
    error: Option<String>,
}

impl RecommendationView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(form: FormInput) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn recommendations(&self) -> Option<&[Recommendation]> {
        self.recommendations.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Update one field by its form name. Invalid input leaves the form unchanged.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "cropType" => self.form.crop_type = value.to_string(),
            "soilQuality" => self.form.soil_quality = value.parse()?,
            "climate" => self.form.climate = value.parse()?,
            "growthStage" => self.form.growth_stage = value.parse()?,
            "nutrientDeficiencies" => self.form.nutrient_deficiencies = value.to_string(),
            other => {
                return Err(AgriError::validation(format!("unknown form field '{}'", other)));
            }
        }
        Ok(())
    }

    pub fn submit_label(&self) -> &'static str {
        if self.loading {
            SUBMIT_LABEL_BUSY
        } else {
            SUBMIT_LABEL
        }
    }

    /// Enter the pending state and snapshot the form.
    ///
    /// Only one submission may be pending at a time.
    pub fn begin_submit(&mut self) -> Result<FormInput> {
        if self.loading {
            return Err(AgriError::validation("a submission is already pending"));
        }
        self.loading = true;
        self.error = None;
        Ok(self.form.clone())
    }

    /// Leave the pending state with the advisor's outcome
    pub fn finish<E: fmt::Display>(&mut self, outcome: std::result::Result<Vec<Recommendation>, E>) {
        match outcome {
            Ok(recs) => self.recommendations = Some(recs),
            Err(err) => {
                let message = err.to_string();
                self.error = Some(if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                });
                self.recommendations = None;
            }
        }
        self.loading = false;
    }

    /// Run one submission through `advisor`.
    ///
    /// Dropping the returned future before it completes leaves the view idle
    /// with its previous results, so a cancelled submission can be retried.
    pub async fn submit(&mut self, advisor: &dyn Advisor) -> Result<()> {
        let form = self.begin_submit()?;
        let pending = PendingSubmit { view: self };
        let outcome = advisor.recommend(&form).await;
        if let Err(err) = &outcome {
            tracing::warn!("{} advisor failed: {}", advisor.name(), err);
        }
        pending.view.finish(outcome);
        Ok(())
    }

    pub fn display(&self) -> Display<'_> {
        if self.loading {
            return Display::Loading;
        }
        if let Some(message) = self.error.as_deref() {
            return Display::Error(message);
        }
        match self.recommendations.as_deref() {
            Some(recs) if !recs.is_empty() => Display::Cards(recs),
            _ => Display::Empty,
        }
    }
}

/// Clears the pending flag however a submission ends
struct PendingSubmit<'a> {
    view: &'a mut RecommendationView,
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        self.view.loading = false;
    }
}
