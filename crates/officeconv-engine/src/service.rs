//! Async conversion service over a fixed set of engine sessions.
//!
//! A session serves one document at a time, so the service keeps one
//! orchestrator per session behind a mutex and admits at most that many
//! conversions at once. The conversions themselves run on the blocking
//! thread pool.

use std::sync::Arc;
use std::time::Instant;

use officeconv_core::config::AppConfig;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::bridge::{BridgeAddress, OfficeBridge};
use crate::error::{ConversionError, FilterDirection};
use crate::filters::FilterAliasTable;
use crate::metrics::{ConversionMetrics, MetricsSnapshot};
use crate::models::{ConversionOutput, ConversionRequest};
use crate::orchestrator::ConversionOrchestrator;
use crate::session::RemoteOfficeSession;

/// Pool of engine sessions accepting concurrent conversion requests.
#[derive(Debug, Clone)]
pub struct ConverterService {
    slots: Arc<Vec<Arc<Mutex<ConversionOrchestrator>>>>,
    limiter: Arc<Semaphore>,
    metrics: Arc<ConversionMetrics>,
    allow_index_update: bool,
}

impl ConverterService {
    /// Open `conversion.max_sessions` sessions to the configured engine.
    pub fn connect(bridge: &dyn OfficeBridge, config: &AppConfig) -> Result<Self, ConversionError> {
        let address = BridgeAddress::new(&config.bridge.interface, config.bridge.port);
        let count = config.conversion.max_sessions.max(1);

        let slots = (0..count)
            .map(|_| -> Result<_, ConversionError> {
                let session = RemoteOfficeSession::connect(bridge, address.clone())?;
                Ok(Arc::new(Mutex::new(ConversionOrchestrator::with_config(
                    session,
                    &config.conversion,
                ))))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(%address, sessions = count, "Conversion service ready");

        Ok(Self {
            slots: Arc::new(slots),
            limiter: Arc::new(Semaphore::new(count)),
            metrics: Arc::new(ConversionMetrics::new()),
            allow_index_update: config.conversion.update_index,
        })
    }

    /// Number of engine sessions.
    pub fn session_count(&self) -> usize {
        self.slots.len()
    }

    /// Current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Convert one document on the first free session.
    pub async fn convert(
        &self,
        mut request: ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        request.update_index &= self.allow_index_update;

        let input_bytes = request.effective_input_bytes().map_or(0, |b| b.len() as u64);
        self.metrics.record_started(input_bytes);
        let started = Instant::now();

        let result = self.run(request).await;

        match &result {
            Ok(output) => {
                self.metrics.record_success(started.elapsed(), output_size(output));
            }
            Err(e) => {
                warn!(error = %e, "Conversion failed");
                self.metrics.record_failure();
            }
        }
        result
    }

    /// Alias table for one filter direction, from the first free session.
    pub async fn filter_names(
        &self,
        direction: FilterDirection,
    ) -> Result<FilterAliasTable, ConversionError> {
        let lease = self.lease().await?;

        tokio::task::spawn_blocking(move || {
            // Move the whole lease, not just the guard
            let lease = lease;
            lease
                .orchestrator
                .session()
                .filters()
                .filter_names(direction)
                .map_err(ConversionError::from)
        })
        .await?
    }

    async fn run(&self, request: ConversionRequest) -> Result<ConversionOutput, ConversionError> {
        let lease = self.lease().await?;

        tokio::task::spawn_blocking(move || {
            // Move the whole lease, not just the guard
            let mut lease = lease;
            lease.orchestrator.convert(&request)
        })
        .await?
    }

    /// Take a permit, then lock a free session.
    ///
    /// A lease unlocks its session before returning its permit, so a
    /// permit holder always finds an unlocked session.
    async fn lease(&self) -> Result<SessionLease, ConversionError> {
        let permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|_| ConversionError::SemaphoreClosed {
                reason: "Session semaphore closed".to_string(),
            })?;

        loop {
            for (slot, mutex) in self.slots.iter().enumerate() {
                if let Ok(orchestrator) = Arc::clone(mutex).try_lock_owned() {
                    debug!(slot, "Claimed session");
                    return Ok(SessionLease {
                        orchestrator,
                        _permit: permit,
                    });
                }
            }
            // Sessions are only locked under a permit; rescan instead of waiting on one
            tokio::task::yield_now().await;
        }
    }
}

/// A locked session plus the permit that admitted it.
///
/// Fields drop in declaration order: the session unlocks first.
#[derive(Debug)]
struct SessionLease {
    orchestrator: OwnedMutexGuard<ConversionOrchestrator>,
    _permit: OwnedSemaphorePermit,
}

fn output_size(output: &ConversionOutput) -> u64 {
    match output {
        ConversionOutput::Bytes(bytes) => bytes.len() as u64,
        ConversionOutput::Written(path) => std::fs::metadata(path).map_or(0, |m| m.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::mock::MockOfficeEngine;

    fn config(sessions: usize, temp: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.conversion.max_sessions = sessions;
        config.conversion.temp_root = Some(temp.to_path_buf());
        config
    }

    #[tokio::test]
    async fn test_connect_opens_all_sessions() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(3, temp.path())).expect("connect");
        assert_eq!(service.session_count(), 3);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let engine = MockOfficeEngine::new();
        engine.set_refuse_connections(true);
        let temp = tempfile::tempdir().expect("tempdir");
        let err = ConverterService::connect(&engine, &config(2, temp.path())).expect_err("fail");
        assert!(matches!(err, ConversionError::SessionBootstrap(_)));
    }

    #[tokio::test]
    async fn test_concurrent_conversions_record_metrics() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(2, temp.path())).expect("connect");

        let tasks = (0..6).map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let request =
                    ConversionRequest::from_bytes(format!("document {i}")).convert_to("pdf");
                service.convert(request).await
            })
        });

        for task in tasks.collect::<Vec<_>>() {
            let output = task.await.expect("join").expect("convert");
            assert!(output.bytes().expect("bytes").starts_with(b"%PDF-"));
        }

        let snap = service.metrics();
        assert_eq!(snap.conversions_started, 6);
        assert_eq!(snap.conversions_succeeded, 6);
        assert_eq!(snap.conversions_failed, 0);
        assert_eq!(engine.closes(), 6);
    }

    #[tokio::test]
    async fn test_failed_conversion_counts_failure() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(1, temp.path())).expect("connect");

        let request = ConversionRequest::from_bytes(b"x".to_vec()).convert_to("nope");
        let err = service.convert(request).await.expect_err("must fail");
        assert!(matches!(err, ConversionError::UnknownExportType { .. }));
        assert_eq!(service.metrics().conversions_failed, 1);
    }

    #[tokio::test]
    async fn test_config_can_disable_index_update() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = config(1, temp.path());
        config.conversion.update_index = false;
        let service = ConverterService::connect(&engine, &config).expect("connect");

        let request = ConversionRequest::from_bytes(b"toc".to_vec()).convert_to("odt");
        service.convert(request).await.expect("convert");
        assert_eq!(engine.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_filter_names() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(1, temp.path())).expect("connect");

        let exports = service
            .filter_names(FilterDirection::Export)
            .await
            .expect("names");
        assert_eq!(exports.resolve("xlsx"), Some("Calc MS Excel 2007 XML"));
    }

    #[tokio::test]
    async fn test_waiting_request_takes_freed_session() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(2, temp.path())).expect("connect");

        let busy = service.lease().await.expect("first session");
        let other = service.lease().await.expect("second session");

        let waiter = tokio::spawn({
            let service = service.clone();
            async move {
                let request = ConversionRequest::from_bytes(b"queued".to_vec()).convert_to("pdf");
                service.convert(request).await
            }
        });
        tokio::task::yield_now().await;
        drop(other);

        let output = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .expect("request must not wait on the busy session")
            .expect("join")
            .expect("convert");
        assert!(output.bytes().expect("bytes").starts_with(b"%PDF-"));
        drop(busy);
        assert_eq!(service.limiter.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_written_output_counts_file_size() {
        let engine = MockOfficeEngine::new();
        let temp = tempfile::tempdir().expect("tempdir");
        let service = ConverterService::connect(&engine, &config(1, temp.path())).expect("connect");
        let target = temp.path().join("out.pdf");

        let request = ConversionRequest::from_bytes(b"report".to_vec()).write_to(&target);
        service.convert(request).await.expect("convert");

        let size = std::fs::metadata(&target).expect("written").len();
        assert!(size > 0);
        assert_eq!(service.metrics().total_output_bytes, size);
    }
}
