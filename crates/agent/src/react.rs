//! Reasoning-action interaction loop.
//!
//! One interaction appends the prompt as a user turn, then alternates
//! model turns with local action execution:
//!
//! 1. Send the whole transcript to the provider (with retry/backoff)
//! 2. Append the reply as an assistant turn and classify it
//! 3. `Final Answer` ends the interaction
//! 4. `Action` runs through the executor; its observation becomes a user turn
//! 5. Anything else is recovered as well as possible and ends the interaction
//!
//! At most `max_iterations` actions run per interaction. Actions may start
//! nested interactions on the same transcript, so the entry point returns a
//! boxed future.

use std::time::Instant;

use chrono::Utc;
use frontsmith_core::error::{InteractionError, ProviderError};
use frontsmith_core::event::DomainEvent;
use frontsmith_core::message::Message;
use frontsmith_core::provider::ProviderRequest;
use frontsmith_protocol::{extract_final_answer, parse_reply, Directive};
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::session::AgentSession;
use crate::trace::{InteractionTrace, TraceKind};

/// How an interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionExit {
    FinalAnswer,
    /// The reply followed no protocol; `recovered` is false when the raw text was returned
    Degraded { recovered: bool },
    /// Ran out of iterations; `recovered` is true when the last reply still held a final answer
    IterationsExhausted { recovered: bool },
}

#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    pub answer: String,
    pub exit: InteractionExit,
    /// Actions executed during this interaction
    pub iterations: u32,
    pub trace: InteractionTrace,
}

impl AgentSession {
    /// Run one interaction and return its final answer.
    pub fn run_interaction<'a>(
        &'a mut self,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<InteractionOutcome, InteractionError>> {
        async move { self.interaction_loop(prompt).await }.boxed()
    }

    async fn interaction_loop(&mut self, prompt: &str) -> Result<InteractionOutcome, InteractionError> {
        let max_iterations = self.settings.max_iterations;
        let filter = self.settings.degraded_filter;

        info!(
            transcript = %self.transcript.id,
            max_iterations,
            "Interaction starting"
        );

        self.transcript.push(Message::user(prompt));

        let mut trace = InteractionTrace::new();
        let mut iterations = 0u32;
        let mut last_reply = String::new();

        while iterations < max_iterations {
            let reply = self.call_model().await?;
            self.transcript.push(Message::assistant(reply.clone()));

            let parsed = parse_reply(&reply, filter);
            if let Some(thought) = parsed.thought {
                debug!(iteration = iterations, thought = %thought, "Model thought");
                trace.push(TraceKind::Thought, thought);
            }

            match parsed.directive {
                Directive::Final { answer, tier } => {
                    info!(iterations, ?tier, "Interaction complete");
                    trace.push(TraceKind::Answer, answer.clone());
                    return Ok(InteractionOutcome {
                        answer,
                        exit: InteractionExit::FinalAnswer,
                        iterations,
                        trace,
                    });
                }
                Directive::Action(parsed_action) => {
                    let action = Action::from_parsed(&parsed_action);
                    let name = action.name().to_string();
                    trace.push(
                        TraceKind::Action,
                        format!("{}({})", parsed_action.name, parsed_action.raw_arguments),
                    );

                    let started = Instant::now();
                    let observation = self.execute(action).await;
                    let duration_ms = started.elapsed().as_millis() as u64;

                    debug!(action = %name, duration_ms, "Action executed");
                    self.event_bus.publish(DomainEvent::ActionExecuted {
                        action: name,
                        duration_ms,
                        timestamp: Utc::now(),
                    });

                    trace.push(TraceKind::Observation, observation.clone());
                    self.transcript
                        .push(Message::user(format!("Observation: {observation}")));
                    iterations += 1;
                }
                Directive::Degraded { text, recovered } => {
                    trace.push(TraceKind::Warning, "Reply followed no protocol marker");
                    trace.push(TraceKind::Answer, text.clone());
                    return Ok(InteractionOutcome {
                        answer: text,
                        exit: InteractionExit::Degraded { recovered },
                        iterations,
                        trace,
                    });
                }
            }

            last_reply = reply;
        }

        // Out of turns: the last reply may still carry an answer next to its action.
        let (answer, recovered) = match extract_final_answer(&last_reply) {
            Some(answer) => (answer, true),
            None => {
                warn!(
                    max_iterations,
                    "Iteration limit reached without a final answer, returning last reply"
                );
                (last_reply, false)
            }
        };
        trace.push(TraceKind::Answer, answer.clone());

        Ok(InteractionOutcome {
            answer,
            exit: InteractionExit::IterationsExhausted { recovered },
            iterations,
            trace,
        })
    }

    /// One model turn over the full transcript.
    ///
    /// Transient failures are retried `max_retries` times, waiting
    /// `backoff_base * 2^attempt` before each retry.
    async fn call_model(&self) -> Result<String, InteractionError> {
        let max_retries = self.settings.max_retries;
        let mut attempt = 0u32;

        loop {
            let mut request = ProviderRequest::new(self.model.clone(), self.transcript.messages.clone());
            request.temperature = self.temperature;
            request.max_tokens = self.max_tokens;

            match self.provider.complete(request).await {
                Ok(response) => {
                    let content = response.message.content;
                    self.event_bus.publish(DomainEvent::ModelResponded {
                        transcript_id: self.transcript.id.to_string(),
                        model: response.model,
                        attempt: attempt + 1,
                        chars: content.chars().count(),
                        timestamp: Utc::now(),
                    });
                    return Ok(content);
                }
                Err(e) => {
                    let will_retry = e.is_transient() && attempt < max_retries;
                    warn!(
                        provider = self.provider.name(),
                        attempt = attempt + 1,
                        error = %e,
                        will_retry,
                        "Model call failed"
                    );
                    self.event_bus.publish(DomainEvent::ModelCallFailed {
                        attempt: attempt + 1,
                        error_message: e.to_string(),
                        will_retry,
                        timestamp: Utc::now(),
                    });

                    if !will_retry {
                        return Err(give_up(e, attempt + 1));
                    }

                    let delay = self
                        .settings
                        .backoff_base
                        .saturating_mul(2u32.saturating_pow(attempt));
                    debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn give_up(error: ProviderError, attempts: u32) -> InteractionError {
    if error.is_transient() {
        InteractionError::RetriesExhausted { attempts, last_error: error }
    } else {
        InteractionError::Fatal(error)
    }
}
