//! Toolbox: the ordered set of facades handed to the agent for one trial

use super::dispatch::DispatchTools;
use super::facade::{ToolCallError, ToolDefinition, ToolFacade, TrialContext};
use super::named::NamedOperationTools;
use crate::journal::ToolClass;
use serde_json::Value;
use std::sync::Arc;

/// Build the facade implementing a tool class
pub fn build_facade(class: ToolClass, ctx: TrialContext) -> Arc<dyn ToolFacade> {
    match class {
        ToolClass::NamedOperations => Arc::new(NamedOperationTools::new(ctx)),
        ToolClass::SingleDispatch => Arc::new(DispatchTools::new(ctx)),
    }
}

/// Facades exposed to the agent, in registration order.
///
/// Order matters: definitions are advertised in this order and a tool name is
/// routed to the first facade that exposes it.
#[derive(Clone, Default)]
pub struct Toolbox {
    facades: Vec<Arc<dyn ToolFacade>>,
}

impl Toolbox {
    /// Create an empty toolbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a toolbox with one facade per class, sharing the trial context
    pub fn for_classes(classes: &[ToolClass], ctx: &TrialContext) -> Self {
        classes.iter().fold(Self::new(), |toolbox, class| {
            toolbox.with_facade(build_facade(*class, ctx.clone()))
        })
    }

    /// Register a facade
    pub fn with_facade(mut self, facade: Arc<dyn ToolFacade>) -> Self {
        self.facades.push(facade);
        self
    }

    /// Facade classes in registration order
    pub fn classes(&self) -> Vec<ToolClass> {
        self.facades.iter().map(|f| f.class()).collect()
    }

    /// All tool definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.facades.iter().flat_map(|f| f.definitions()).collect()
    }

    /// Route a call to the first facade exposing `name`
    pub fn invoke(&self, name: &str, args: &Value) -> Result<bool, ToolCallError> {
        let facade = self
            .facades
            .iter()
            .find(|f| f.handles(name))
            .ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?;

        match facade.invoke(name, args) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Rejected tool call");
                Err(e)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facades.is_empty()
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("classes", &self.classes())
            .finish()
    }
}
