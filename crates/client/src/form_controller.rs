//! Create/edit dialog controller.
//!
//! Validation runs before anything is sent and reports every problem in one
//! notice. A submit guard keeps a second click from sending a duplicate
//! request. On failure the entered values stay so the user can fix and
//! resend.

use std::sync::Arc;

use facility_core::form::{FormSchema, FormValues, SubmitGuard, ValidationReport};
use facility_core::notice::Notice;
use facility_core::resources::Resource;
use facility_core::types::EntityId;
use facility_gateway::{Attachment, Gateway, GatewayError, MutationBody};
use serde_json::Value;

/// What happens after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBehavior {
    /// Reset the form for another entry.
    Clear,
    /// Leave the form for `route`.
    Navigate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(ValidationReport),
    /// A submit is already in flight; nothing was sent.
    Busy,
    /// The backend accepted the record.
    Saved {
        response: Value,
        navigate_to: Option<String>,
    },
    /// The backend rejected the record or could not be reached.
    Failed { message: String },
}

/// A validated submit holding the guard, ready to send.
#[derive(Debug, Clone)]
pub struct PreparedSubmit {
    resource: Resource,
    target: Option<EntityId>,
    body: MutationBody,
}

impl PreparedSubmit {
    pub fn body(&self) -> &MutationBody {
        &self.body
    }

    pub async fn send(&self, gateway: &dyn Gateway) -> Result<Value, GatewayError> {
        match self.target {
            Some(id) => gateway.update(self.resource, id, &self.body).await,
            None => gateway.create(self.resource, &self.body).await,
        }
    }
}

pub struct FormController {
    gateway: Arc<dyn Gateway>,
    resource: Resource,
    schema: FormSchema,
    record_root: Option<String>,
    target: Option<EntityId>,
    behavior: SubmitBehavior,
    success_message: String,
    values: FormValues,
    attachments: Vec<Attachment>,
    guard: SubmitGuard,
    notices: Vec<Notice>,
}

impl FormController {
    /// A create form for `resource`.
    pub fn new(gateway: Arc<dyn Gateway>, resource: Resource, schema: FormSchema) -> Self {
        Self {
            gateway,
            resource,
            schema,
            record_root: None,
            target: None,
            behavior: SubmitBehavior::Clear,
            success_message: format!("{} saved successfully", resource.label()),
            values: FormValues::new(),
            attachments: Vec::new(),
            guard: SubmitGuard::new(),
            notices: Vec::new(),
        }
    }

    /// Edit record `id` instead of creating, starting from `values`.
    pub fn editing(mut self, id: EntityId, values: FormValues) -> Self {
        self.target = Some(id);
        self.values = values;
        self
    }

    pub fn with_record_root(mut self, root: impl Into<String>) -> Self {
        self.record_root = Some(root.into());
        self
    }

    pub fn on_success(mut self, behavior: SubmitBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    // ---- values ----

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Empty every field and drop attachments.
    pub fn clear(&mut self) {
        self.values.clear();
        self.attachments.clear();
    }

    pub fn is_submitting(&self) -> bool {
        self.guard.is_in_flight()
    }

    pub fn validate(&self) -> ValidationReport {
        self.schema.validate(&self.values)
    }

    // ---- submit ----

    /// Validate and take the submit guard.
    ///
    /// Returns `Err` with the outcome to show when the submit must not be
    /// sent: the form is invalid (one aggregated notice is queued) or
    /// another submit is in flight.
    pub fn prepare_submit(&mut self) -> Result<PreparedSubmit, SubmitOutcome> {
        if self.guard.is_in_flight() {
            tracing::debug!(resource = %self.resource, "Ignoring submit while one is in flight");
            return Err(SubmitOutcome::Busy);
        }

        let report = self.validate();
        if !report.is_valid() {
            tracing::debug!(resource = %self.resource, errors = report.errors.len(), "Form is invalid");
            self.notices.push(Notice::error(report.summary()));
            return Err(SubmitOutcome::Invalid(report));
        }

        if self.guard.begin().is_err() {
            return Err(SubmitOutcome::Busy);
        }

        let mut body = MutationBody::new(self.values.clone());
        body.root = self.record_root.clone();
        body.attachments = self.attachments.clone();

        Ok(PreparedSubmit {
            resource: self.resource,
            target: self.target,
            body,
        })
    }

    /// Release the guard and apply the backend's answer.
    pub fn complete_submit(&mut self, result: Result<Value, GatewayError>) -> SubmitOutcome {
        self.guard.finish();
        match result {
            Ok(response) => {
                tracing::info!(resource = %self.resource, id = ?self.target, "Form saved");
                self.notices.push(Notice::success(self.success_message.clone()));
                let navigate_to = match &self.behavior {
                    SubmitBehavior::Clear => {
                        self.clear();
                        None
                    }
                    SubmitBehavior::Navigate(route) => Some(route.clone()),
                };
                SubmitOutcome::Saved {
                    response,
                    navigate_to,
                }
            }
            Err(e) => {
                tracing::error!(resource = %self.resource, error = %e, "Form submit failed");
                let message = e.user_message();
                self.notices.push(Notice::error(message.clone()));
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Validate, send, and apply the result.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let prepared = match self.prepare_submit() {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };
        let gateway = Arc::clone(&self.gateway);
        let result = prepared.send(gateway.as_ref()).await;
        self.complete_submit(result)
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
