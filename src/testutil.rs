//! Fakes shared by the unit tests.

use crate::links::LinkService;
use crate::memory::MemoryStore;
use crate::store::LinkStore;
use crate::validator::HostResolver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolver answering from a fixed table; unknown hosts fail to resolve.
#[derive(Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, addresses: &[&str]) -> Self {
        let addresses = addresses
            .iter()
            .map(|address| address.parse().unwrap())
            .collect();
        self.hosts.insert(host.to_string(), addresses);
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(host)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such host"))
    }
}

pub fn public_resolver() -> StaticResolver {
    StaticResolver::new()
        .with("example.com", &["93.184.216.34"])
        .with("www.rust-lang.org", &["13.35.20.17"])
        .with("intranet.corp.example", &["10.0.0.5"])
}

/// Link service over a fresh in-memory store; the store is returned for inspection.
pub fn memory_service() -> (LinkService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = LinkService::new(store.clone() as Arc<dyn LinkStore>, Arc::new(public_resolver()));
    (service, store)
}
