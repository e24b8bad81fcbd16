//! Plugin runtime for quire.
//!
//! Plugins are declared as [`PluginDef`]s, registered with a [`PluginHost`]
//! and activated in dependency order. Each plugin talks to the rest of the
//! system only through its [`PluginApi`].

mod activate;
mod api;
mod config;
mod def;
mod error;
pub mod events;
mod generation;
mod graph;
mod host;
mod registry;
mod services;
mod ui;

pub use activate::ActivationSummary;
pub use api::{AutoDismiss, PluginApi, Utils};
pub use config::{ConfigError, HostConfig};
pub use def::{Factory, Hook, PluginDef, Provides, ServiceSet, UiSlots};
pub use error::{GraphError, RegistrationError, ServiceError};
pub use events::{Event, EventBus, EventHandler, EventSubscription};
pub use generation::TaskToken;
pub use graph::{DependencyNode, activation_order};
pub use host::{LOG_MIDDLEWARE_ID, PluginHost};
pub use registry::{PluginRegistry, PluginStatus};
pub use services::{AnyService, DuplicateServicePolicy, ServiceRegistry};
pub use ui::{Dispatcher, RenderedSlot, ServiceLookup, SlotProps, SlotRegistry, SlotRenderer, UiHost, slot_renderer};
