//! Cascading selectors backed by an option loader.
//!
//! [`CascadeController`] drives a [`CascadeState`]: on mount it loads the
//! first level, and each selection loads the level below it. Options come
//! from an [`OptionLoader`]; [`RemoteOptionLoader`] asks the backend for
//! children of the selected parent, [`LocalOptionLoader`] filters lists that
//! were fetched up front.

use std::sync::Arc;

use async_trait::async_trait;
use facility_core::cascade::{self, CascadeOption, CascadeState, OptionsRequest};
use facility_core::error::CoreError;
use facility_core::filter::{FilterPredicate, FilterSet};
use facility_core::list_state::ApplyOutcome;
use facility_core::notice::Notice;
use facility_core::query::{ListQuery, MAX_PAGE_SIZE};
use facility_core::resources::Resource;
use facility_core::types::EntityId;
use facility_gateway::{Gateway, GatewayError};
use serde_json::Value;

/// Source of options for one cascade level.
#[async_trait]
pub trait OptionLoader: Send + Sync {
    /// Options for `level`, given the id selected one level up (`None` for
    /// the first level).
    async fn load(
        &self,
        level: usize,
        parent: Option<EntityId>,
    ) -> Result<Vec<CascadeOption>, GatewayError>;
}

// ---------------------------------------------------------------------------
// Remote loader
// ---------------------------------------------------------------------------

/// Loads each level from its backend collection, filtered by the parent's
/// foreign key (`q[building_id_eq]=4`).
pub struct RemoteOptionLoader {
    gateway: Arc<dyn Gateway>,
    levels: Vec<Resource>,
    label_field: String,
}

impl RemoteOptionLoader {
    pub fn new(gateway: Arc<dyn Gateway>, levels: &[Resource]) -> Self {
        Self {
            gateway,
            levels: levels.to_vec(),
            label_field: "name".to_string(),
        }
    }

    /// Read option labels from `field` instead of `name`.
    pub fn with_label_field(mut self, field: impl Into<String>) -> Self {
        self.label_field = field.into();
        self
    }

    fn to_option(&self, resource: Resource, row: &Value) -> Option<CascadeOption> {
        let id = row.get("id")?.as_i64()?;
        let label = row
            .get(&self.label_field)
            .or_else(|| row.get("name"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("#{id}"));
        let parent_id = resource
            .parent_field()
            .and_then(|f| row.get(f))
            .and_then(Value::as_i64);
        Some(CascadeOption {
            id,
            label,
            parent_id,
        })
    }
}

#[async_trait]
impl OptionLoader for RemoteOptionLoader {
    async fn load(
        &self,
        level: usize,
        parent: Option<EntityId>,
    ) -> Result<Vec<CascadeOption>, GatewayError> {
        let resource = *self.levels.get(level).ok_or_else(|| {
            CoreError::Validation(format!("No resource configured for cascade level {level}"))
        })?;

        let mut filters = FilterSet::new();
        if let (Some(parent), Some(field)) = (parent, resource.parent_field()) {
            filters.insert(field, FilterPredicate::equals(parent.to_string()))?;
        }
        let mut query = ListQuery::new(MAX_PAGE_SIZE)?;
        query.set_filters(&filters);

        let page = self.gateway.fetch_page(resource, &query).await?;
        Ok(page
            .rows
            .iter()
            .filter_map(|row| self.to_option(resource, row))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Local loader
// ---------------------------------------------------------------------------

/// Serves options from lists already in memory, e.g. categories loaded with
/// their subcategories in one request.
#[derive(Debug, Clone, Default)]
pub struct LocalOptionLoader {
    levels: Vec<Vec<CascadeOption>>,
}

impl LocalOptionLoader {
    pub fn new(levels: Vec<Vec<CascadeOption>>) -> Self {
        Self { levels }
    }
}

#[async_trait]
impl OptionLoader for LocalOptionLoader {
    async fn load(
        &self,
        level: usize,
        parent: Option<EntityId>,
    ) -> Result<Vec<CascadeOption>, GatewayError> {
        let all = self.levels.get(level).ok_or_else(|| {
            CoreError::Validation(format!("No options configured for cascade level {level}"))
        })?;
        Ok(match parent {
            Some(parent) => cascade::filter_children(all, parent),
            None => all.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct CascadeController {
    state: CascadeState,
    loader: Arc<dyn OptionLoader>,
    notices: Vec<Notice>,
}

impl CascadeController {
    pub fn new(names: &[&str], loader: Arc<dyn OptionLoader>) -> Result<Self, CoreError> {
        Ok(Self {
            state: CascadeState::new(names)?,
            loader,
            notices: Vec::new(),
        })
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    /// Reset every level and load the first one.
    pub async fn mount(&mut self) -> ApplyOutcome {
        let request = self.state.mount();
        self.load(request).await
    }

    /// Select `value` at `index`. A new value loads the next level's
    /// options; clearing disables everything below.
    pub async fn select(
        &mut self,
        index: usize,
        value: Option<EntityId>,
    ) -> Result<Option<ApplyOutcome>, CoreError> {
        match self.state.select(index, value)? {
            Some(request) => Ok(Some(self.load(request).await)),
            None => Ok(None),
        }
    }

    /// Select a full path from the top, e.g. when opening an edit form with
    /// a saved location. Stops at the first level that fails.
    pub async fn select_path(&mut self, ids: &[EntityId]) -> Result<(), CoreError> {
        for (index, id) in ids.iter().enumerate() {
            self.select(index, Some(*id)).await?;
        }
        Ok(())
    }

    async fn load(&mut self, request: OptionsRequest) -> ApplyOutcome {
        match self.loader.load(request.level, request.parent).await {
            Ok(options) => self.state.options_loaded(&request, options),
            Err(e) => {
                let name = self.state.name(request.level).unwrap_or_default().to_string();
                tracing::error!(selector = %name, error = %e, "Failed to load cascade options");
                let outcome = self.state.options_failed(&request);
                if outcome == ApplyOutcome::Applied {
                    self.notices.push(Notice::error(format!(
                        "Could not load {name} options. {}",
                        e.user_message()
                    )));
                }
                outcome
            }
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
