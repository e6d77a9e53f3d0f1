use async_trait::async_trait;
use cloud_orders_metrics::RunOutcome;
use cloud_orders_types::Phase;

use crate::{Clients, FulfillmentError, OrderContext};

/// What the pipeline does after a step returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run the next step
    Continue,
    /// Stop for this invocation; the next poll resumes from the persisted phase
    Halt,
    /// Stop; the order is waiting on buyer input
    Querying,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Continue => "continue",
            StepOutcome::Halt => "halt",
            StepOutcome::Querying => "querying",
        }
    }

    /// Outcome of a whole pipeline run that ended with `self`
    pub fn run_outcome(&self) -> RunOutcome {
        match self {
            StepOutcome::Continue => RunOutcome::Completed,
            StepOutcome::Halt => RunOutcome::Halted,
            StepOutcome::Querying => RunOutcome::Querying,
        }
    }
}

/// One unit of fulfillment work.
///
/// A step must be safe to invoke again on every poll: it inspects the
/// context and persisted parameters, and does nothing (returning
/// [`StepOutcome::Continue`]) when it is not applicable.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Phases this step acts in; empty for steps that gate themselves on
    /// other state
    fn phases(&self) -> &[Phase] {
        &[]
    }

    /// Whether the step acts in `phase`
    fn acts_in(&self, phase: Phase) -> bool {
        self.phases().contains(&phase)
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError>;
}
