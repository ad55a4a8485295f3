// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::{BlockScanner, ChainGateway, TransferService};
use crate::config::{NetworkProfile, ServiceConfig, Stage};
use crate::secrets::SecretCache;

#[derive(Clone)]
pub struct AppState {
    pub stage: Stage,
    pub network: Arc<NetworkProfile>,
    pub transfers: Arc<TransferService>,
    pub scanner: BlockScanner,
}

impl AppState {
    pub fn new(
        config: &ServiceConfig,
        gateway: Arc<dyn ChainGateway>,
        secrets: Arc<SecretCache>,
    ) -> Self {
        let transfers = TransferService::new(
            gateway.clone(),
            secrets,
            &config.network.chain_id,
            &config.network.address_prefix,
            config.gas,
        );
        Self {
            stage: config.stage,
            network: Arc::new(config.network.clone()),
            transfers: Arc::new(transfers),
            scanner: BlockScanner::new(gateway, config.scanner),
        }
    }
}
