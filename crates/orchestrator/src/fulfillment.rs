use cloud_orders_connectors::FailureReport;
use cloud_orders_metrics::{FulfillmentSpan, RunOutcome};
use cloud_orders_types::Flow;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn, Instrument, Span};

use crate::flows::pipeline_for;
use crate::report::{failure_trace, redact_trace_ids};
use crate::{Clients, FulfillmentError, OrderContext, Pipeline, PipelineError, StepOutcome};

/// Entry point the poller calls once per actionable order.
///
/// Selects the pipeline for the order's flow and runs it. Errors are
/// reported to the operator channel exactly once and returned.
pub struct Fulfiller {
    clients: Clients,
    pipelines: HashMap<Flow, Pipeline>,
}

impl Fulfiller {
    pub fn new(clients: Clients) -> Result<Self, PipelineError> {
        let pipelines = Flow::ALL
            .iter()
            .map(|flow| Ok((*flow, pipeline_for(*flow)?)))
            .collect::<Result<HashMap<_, _>, PipelineError>>()?;

        Ok(Self { clients, pipelines })
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Load the order from storage and fulfill it
    pub async fn fulfill_by_id(&self, order_id: &str) -> Result<StepOutcome, FulfillmentError> {
        match self.clients.store.get(order_id).await {
            Ok(order_data) => self.fulfill(order_data).await,
            Err(e) => {
                let e = FulfillmentError::from(e);
                self.report_failure(order_id, None, &e)
                    .instrument(FulfillmentSpan::new(order_id).span())
                    .await;
                Err(e)
            }
        }
    }

    /// Fulfill an order from its raw payload
    pub async fn fulfill(&self, order_data: Value) -> Result<StepOutcome, FulfillmentError> {
        let order_id = order_data
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        let span = FulfillmentSpan::new(order_id.as_str()).span();

        async {
            let mut flow = None;
            let result = self.run(order_data, &mut flow).await;
            if let Err(e) = &result {
                self.report_failure(&order_id, flow, e).await;
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        order_data: Value,
        selected: &mut Option<Flow>,
    ) -> Result<StepOutcome, FulfillmentError> {
        // 1. Build the context
        let mut ctx = OrderContext::from_order_data(order_data)?;
        if !ctx.order.status.is_actionable() {
            info!(status = ?ctx.order.status, "Order is not awaiting fulfillment");
            return Ok(StepOutcome::Halt);
        }

        // 2. Select the flow's pipeline
        let flow = ctx.flow()?;
        *selected = Some(flow);
        FulfillmentSpan::record_flow(&Span::current(), flow);
        let pipeline = self
            .pipelines
            .get(&flow)
            .ok_or_else(|| FulfillmentError::UnsupportedOrder {
                order_id: ctx.order_id().to_string(),
                reason: format!("no pipeline for {flow}"),
            })?;

        // 3. Run it
        info!(
            flow = %flow,
            status = ?ctx.order.status,
            phase = %ctx.phase()?,
            "Fulfillment started"
        );
        self.clients.record(|m| m.record_fulfillment_started(flow));
        let started = Instant::now();
        let result = pipeline.run(&self.clients, &mut ctx).await;

        let outcome = match &result {
            Ok(outcome) => outcome.run_outcome(),
            Err(_) => RunOutcome::Failed,
        };
        self.clients
            .record(|m| m.record_fulfillment_finished(flow, outcome, started.elapsed()));
        if result.is_ok() {
            info!(flow = %flow, outcome = outcome.as_str(), "Fulfillment finished");
        }
        result
    }

    /// Tell operators about a failed invocation and, when configured, fail
    /// the order. Secondary errors are logged and dropped.
    async fn report_failure(&self, order_id: &str, flow: Option<Flow>, e: &FulfillmentError) {
        let token = &self.clients.config.redaction_token;
        let trace = failure_trace(e, token);
        error!(
            order_id = %order_id,
            error = %redact_trace_ids(&e.to_string(), token),
            error_type = "fulfillment_failed",
            "Fulfillment failed"
        );
        self.clients.record(|m| m.record_failure(flow));

        let report = FailureReport {
            order_id: order_id.to_string(),
            trace: trace.clone(),
        };
        if let Err(notify_error) = self.clients.notifier.report_failure(report).await {
            warn!(order_id = %order_id, error = %notify_error, "Failure report not delivered");
        }

        if self.clients.config.fail_orders_on_error {
            let reason = trace.lines().next().unwrap_or_default();
            match self.clients.store.transition_to_fail(order_id, reason).await {
                Ok(()) => info!(order_id = %order_id, "Order failed"),
                Err(store_error) => {
                    warn!(order_id = %order_id, error = %store_error, "Could not fail order");
                }
            }
        }
    }
}
