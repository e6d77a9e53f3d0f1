use cloud_orders_types::{Flow, Phase};
use tracing::{debug, info};

use crate::{Clients, FulfillmentError, OrderContext, PipelineError, Step, StepOutcome};

/// Ordered steps for one flow
pub struct Pipeline {
    flow: Flow,
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Assemble a pipeline, rejecting steps that act in phases the flow
    /// never enters
    pub fn new(flow: Flow, steps: Vec<Box<dyn Step>>) -> Result<Self, PipelineError> {
        let table = flow.phases();
        for step in &steps {
            if let Some(phase) = step.phases().iter().find(|p| !table.contains(**p)) {
                return Err(PipelineError::ForeignPhase {
                    flow,
                    step: step.name(),
                    phase: *phase,
                });
            }
        }
        Ok(Self { flow, steps })
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Phases some step acts in, in first-declared order
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = Vec::new();
        for phase in self.steps.iter().flat_map(|s| s.phases()) {
            if !phases.contains(phase) {
                phases.push(*phase);
            }
        }
        phases
    }

    /// Run steps in order until one halts, diverts or fails.
    ///
    /// Returns [`StepOutcome::Continue`] only when every step continued.
    pub async fn run(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        let mut cursor = 0;
        while let Some(step) = self.steps.get(cursor) {
            let outcome = step.apply(clients, ctx).await?;
            clients.record(|m| m.record_step(step.name(), outcome.as_str()));

            if outcome != StepOutcome::Continue {
                info!(
                    order_id = %ctx.order_id(),
                    flow = %self.flow,
                    step = step.name(),
                    outcome = outcome.as_str(),
                    "Pipeline stopped"
                );
                return Ok(outcome);
            }

            debug!(order_id = %ctx.order_id(), step = step.name(), "Step continued");
            cursor += 1;
        }
        Ok(StepOutcome::Continue)
    }
}
