//! Test doubles and common utilities for sync contract tests
//!
//! The doubles record what the engine asks of them; none of them talk to a
//! network.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wrc_core::config::{SyncConfig, SyncMode};
use wrc_core::error::{Error, Result};
use wrc_core::record::{ProductFields, Record};
use wrc_core::router::{HostEnvironment, ModeRouter, Routing};
use wrc_core::traits::{SyncTransport, TransportResponse};

/// A transport that records every payload and answers 200
pub struct RecordingTransport {
    /// Call counter for send()
    send_call_count: Arc<AtomicUsize>,
    /// Recorded (endpoint, payload) pairs
    sent: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            send_call_count: Arc::new(AtomicUsize::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a new RecordingTransport that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            send_call_count: Arc::clone(&other.send_call_count),
            sent: Arc::clone(&other.sent),
        }
    }

    /// Get the number of times send() was called
    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }

    /// Get every (endpoint, payload) pair sent so far
    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTransport for RecordingTransport {
    async fn send(&self, endpoint: &str, payload: &serde_json::Value) -> Result<TransportResponse> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload.clone()));

        Ok(TransportResponse {
            status: 200,
            body: "\"ok\"".to_string(),
        })
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}

/// A transport whose receiver is always down
pub struct FailingTransport {
    send_call_count: Arc<AtomicUsize>,
}

impl FailingTransport {
    pub fn new() -> Self {
        Self {
            send_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            send_call_count: Arc::clone(&other.send_call_count),
        }
    }

    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncTransport for FailingTransport {
    async fn send(&self, _endpoint: &str, _payload: &serde_json::Value) -> Result<TransportResponse> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::transport("HTTP 503: receiver unavailable"))
    }

    fn transport_name(&self) -> &'static str {
        "failing"
    }
}

/// Send-mode configuration with complete outbound credentials
pub fn send_config() -> SyncConfig {
    let mut config = SyncConfig::new();
    config.mode = SyncMode::Send;
    config.api_url = "https://receiver.example.nl/wp-json".to_string();
    config.api_username = "sync".to_string();
    config.api_password = "secret".to_string();
    config
}

/// Routing of a send-mode deployment on a host with a product catalog
pub fn sender_routing() -> Routing {
    ModeRouter::route(&send_config(), &HostEnvironment::with_product_catalog())
}

/// A product record with predictable catalog fields
pub fn product(id: u64, sku: &str, name: &str) -> Record {
    Record::product(
        id,
        ProductFields {
            sku: sku.to_string(),
            name: name.to_string(),
            description: "Solid oak dining chair".to_string(),
            short_description: "Oak chair".to_string(),
            slug: "oak-chair".to_string(),
        },
    )
}
