//! Startup mode routing
//!
//! The router decides, once per process, which direction each pipeline runs
//! in. The post pipeline and the product pipeline are routed independently;
//! the product pipeline only exists when the host has a product catalog.
//!
//! ## Usage
//!
//! ```rust
//! use wrc_core::config::{SyncConfig, SyncMode};
//! use wrc_core::router::{HostEnvironment, ModeRouter, PipelineRole};
//!
//! let mut config = SyncConfig::new();
//! config.mode = SyncMode::Receive;
//! config.inbound_username = "receiver".to_string();
//! config.inbound_password = "secret".to_string();
//!
//! let routing = ModeRouter::route(&config, &HostEnvironment::default());
//! assert_eq!(routing.posts, PipelineRole::Receiver);
//! assert_eq!(routing.products, PipelineRole::Disabled);
//! ```

use tracing::{error, info};

use crate::config::{SyncConfig, SyncMode};

/// Facts about the host the router needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    /// A product-catalog extension is active on the host
    pub product_catalog_active: bool,
}

impl HostEnvironment {
    /// Host with a product catalog
    pub fn with_product_catalog() -> Self {
        Self {
            product_catalog_active: true,
        }
    }
}

/// Direction a single pipeline runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRole {
    /// Lifecycle hooks are wired and push to the remote receiver
    Sender,
    /// Inbound routes are mounted
    Receiver,
    /// Nothing is wired for this pipeline
    Disabled,
}

impl PipelineRole {
    /// Whether outbound hooks are active
    pub fn is_sender(&self) -> bool {
        matches!(self, PipelineRole::Sender)
    }

    /// Whether inbound routes are active
    pub fn is_receiver(&self) -> bool {
        matches!(self, PipelineRole::Receiver)
    }
}

/// Result of routing: one role per pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    /// Plain content pipeline
    pub posts: PipelineRole,
    /// Product pipeline
    pub products: PipelineRole,
}

impl Routing {
    /// Both pipelines disabled
    pub fn disabled() -> Self {
        Self {
            posts: PipelineRole::Disabled,
            products: PipelineRole::Disabled,
        }
    }

    /// Whether any pipeline sends
    pub fn any_sender(&self) -> bool {
        self.posts.is_sender() || self.products.is_sender()
    }

    /// Whether any pipeline receives
    pub fn any_receiver(&self) -> bool {
        self.posts.is_receiver() || self.products.is_receiver()
    }
}

/// Decides pipeline roles from configuration
pub struct ModeRouter;

impl ModeRouter {
    /// Route both pipelines
    ///
    /// Invalid credentials for the configured mode are logged and leave the
    /// pipelines disabled; routing itself never fails.
    pub fn route(config: &SyncConfig, host: &HostEnvironment) -> Routing {
        let role = match config.mode {
            SyncMode::Send => match config.outbound_credentials() {
                Ok(creds) => {
                    info!("Send mode: pushing changes to {}", creds.api_url);
                    PipelineRole::Sender
                }
                Err(e) => {
                    error!("Send mode configured but outbound sync is disabled: {}", e);
                    PipelineRole::Disabled
                }
            },
            SyncMode::Receive => match config.inbound_credentials() {
                Ok(_) => {
                    info!("Receive mode: accepting pushes from remote sender");
                    PipelineRole::Receiver
                }
                Err(e) => {
                    error!("Receive mode configured but inbound routes are disabled: {}", e);
                    PipelineRole::Disabled
                }
            },
        };

        let products = if host.product_catalog_active {
            role
        } else {
            info!("No product catalog on host, product pipeline disabled");
            PipelineRole::Disabled
        };

        Routing {
            posts: role,
            products,
        }
    }
}
