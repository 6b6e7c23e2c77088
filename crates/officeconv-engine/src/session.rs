//! Connection context to a running office engine.

use std::sync::Arc;

use officeconv_core::config::bridge::BridgeConfig;
use tracing::info;

use crate::bridge::{
    BridgeAddress, BridgeError, Desktop, OfficeBridge, PropertyValue, RemoteDocument,
    TypeDetection,
};
use crate::error::{ConversionError, FilterDirection};
use crate::filters::{FilterAliasTable, FilterRegistry};

/// Handles to the engine services used by a conversion, plus the filter
/// catalog cache that lives as long as the session.
///
/// A session serves one document operation at a time; share it between
/// tasks only behind a lock.
#[derive(Debug)]
pub struct RemoteOfficeSession {
    address: BridgeAddress,
    desktop: Arc<dyn Desktop>,
    type_detection: Arc<dyn TypeDetection>,
    filters: FilterRegistry,
}

impl RemoteOfficeSession {
    /// Resolve the engine at `address` and obtain its services.
    ///
    /// Fails with [`ConversionError::SessionBootstrap`] if the bridge cannot
    /// be resolved. No retry is attempted.
    pub fn connect(
        bridge: &dyn OfficeBridge,
        address: BridgeAddress,
    ) -> Result<Self, ConversionError> {
        let bootstrap = || -> Result<Self, BridgeError> {
            let context = bridge.resolve(&address)?;
            Ok(Self {
                desktop: context.desktop()?,
                type_detection: context.type_detection()?,
                filters: FilterRegistry::new(context.filter_factory()?),
                address: address.clone(),
            })
        };

        let session = bootstrap().map_err(ConversionError::SessionBootstrap)?;
        info!(address = %session.address, "Connected to office engine");
        Ok(session)
    }

    /// Connect using configured bridge settings.
    pub fn from_config(
        bridge: &dyn OfficeBridge,
        config: &BridgeConfig,
    ) -> Result<Self, ConversionError> {
        Self::connect(bridge, BridgeAddress::new(&config.interface, config.port))
    }

    /// Address this session is connected to.
    pub fn address(&self) -> &BridgeAddress {
        &self.address
    }

    /// The session's filter catalog.
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Alias table of the import filters.
    pub fn import_filter_names(&self) -> Result<FilterAliasTable, BridgeError> {
        self.filters.filter_names(FilterDirection::Import)
    }

    /// Alias table of the export filters.
    pub fn export_filter_names(&self) -> Result<FilterAliasTable, BridgeError> {
        self.filters.filter_names(FilterDirection::Export)
    }

    /// Load the document at `url`.
    pub fn load_document(
        &self,
        url: &str,
        properties: &[PropertyValue],
    ) -> Result<Option<Box<dyn RemoteDocument>>, BridgeError> {
        self.desktop.load_component(url, properties)
    }

    /// Type name of `url`, `None` when type detection does not know it.
    pub fn query_type(&self, url: &str) -> Result<Option<String>, BridgeError> {
        let type_name = self.type_detection.query_type_by_url(url)?;
        Ok(Some(type_name).filter(|t| !t.is_empty()))
    }
}
