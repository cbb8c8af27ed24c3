//! Device Stream - background report producer
//!
//! Owns the device handle on a dedicated OS thread. The thread blocks on
//! bounded-timeout reads and forwards every report through an unbounded
//! channel, so a slow consumer never causes a report to be dropped.
//!
//! # Lifecycle
//!
//! ```text
//! ReportCollector<Initializing> ──► ReportCollector<Collecting> ──► StoppedCollector
//!                                        (read loop)                (source handed back)
//! ```
//!
//! The loop ends when the cancellation token fires, when a read fails, or
//! when the receiving side is dropped. A read failure only ends this thread;
//! the consumer keeps running without input.

use chrono::Local;
use statum::{machine, state};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::DeviceError;
use super::report::{RawReport, REPORT_LEN};

/// Anything that can deliver raw reports with a read timeout.
///
/// `Ok(0)` means the timeout elapsed without data.
pub trait ReportSource: Send {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, DeviceError>;
}

#[derive(Clone, Debug)]
pub struct StreamSettings {
    /// Upper bound for one blocking read, which also bounds shutdown latency
    pub read_timeout_ms: i32,
    /// Read buffer size
    pub report_len: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: 50,
            report_len: REPORT_LEN,
        }
    }
}

/// Why the collection loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    ReadFailed,
    ConsumerGone,
}

/// What is left once the loop has ended
pub struct StoppedCollector {
    pub source: Box<dyn ReportSource>,
    pub reason: StopReason,
    pub reports_sent: u64,
}

#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
pub struct ReportCollector<S: CollectionState> {
    source: Box<dyn ReportSource>,
    settings: StreamSettings,
    sender: mpsc::UnboundedSender<RawReport>,
    cancel: CancellationToken,
    reports_sent: u64,
}

impl<S: CollectionState> ReportCollector<S> {
    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }
}

impl ReportCollector<Initializing> {
    pub fn create(
        source: Box<dyn ReportSource>,
        settings: StreamSettings,
        sender: mpsc::UnboundedSender<RawReport>,
        cancel: CancellationToken,
    ) -> Self {
        debug!("Creating report collector with settings: {:?}", settings);
        Self::new(source, settings, sender, cancel, 0)
    }

    pub fn initialize(self) -> ReportCollector<Collecting> {
        info!(
            "Report collector ready, read timeout {} ms, buffer {} bytes",
            self.settings.read_timeout_ms, self.settings.report_len
        );
        self.transition()
    }
}

impl ReportCollector<Collecting> {
    /// Performs one read. `Ok(None)` for a timeout or a report too short to decode.
    pub fn collect_next_report(&mut self, buf: &mut [u8]) -> Result<Option<RawReport>, DeviceError> {
        let size = self
            .source
            .read_report(buf, self.settings.read_timeout_ms)?;

        if size == 0 {
            return Ok(None);
        }

        match RawReport::from_bytes(&buf[..size]) {
            Some(report) => Ok(Some(report)),
            None => {
                warn!("Skipping short report of {} bytes", size);
                Ok(None)
            }
        }
    }

    pub fn run_collection_loop(mut self) -> StoppedCollector {
        info!("Starting report collection loop");

        let mut buf = vec![0u8; self.settings.report_len];
        let mut window_reports = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);

        let reason = loop {
            if self.cancel.is_cancelled() {
                info!("Stop requested, leaving collection loop");
                break StopReason::Cancelled;
            }

            match self.collect_next_report(&mut buf) {
                Ok(Some(report)) => {
                    if self.sender.send(report).is_err() {
                        info!("Report receiver dropped, leaving collection loop");
                        break StopReason::ConsumerGone;
                    }
                    self.reports_sent += 1;
                    window_reports += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Error reading device, input stops here: {}", e);
                    break StopReason::ReadFailed;
                }
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Report collector stats: {} reports in last {} seconds (avg {:.2}/sec)",
                    window_reports,
                    log_interval.num_seconds(),
                    window_reports as f64 / log_interval.num_seconds() as f64
                );
                window_reports = 0;
                last_log_time = now;
            }
        };

        info!(
            "Report collector stopped ({:?}) after {} reports",
            reason, self.reports_sent
        );
        StoppedCollector {
            source: self.source,
            reason,
            reports_sent: self.reports_sent,
        }
    }
}

/// Handle to the running producer thread
pub struct DeviceStream {
    cancel: CancellationToken,
    thread: Option<JoinHandle<StoppedCollector>>,
}

impl DeviceStream {
    /// Spawns the polling thread. Reports are pushed into `sender`.
    pub fn start(
        source: Box<dyn ReportSource>,
        settings: StreamSettings,
        sender: mpsc::UnboundedSender<RawReport>,
    ) -> Result<Self, DeviceError> {
        info!("Spawning device stream with settings: {:?}", settings);

        let cancel = CancellationToken::new();
        let collector = ReportCollector::create(source, settings, sender, cancel.clone());

        let thread = std::thread::Builder::new()
            .name("report-collector".to_string())
            .spawn(move || collector.initialize().run_collection_loop())?;

        info!("Device stream started");
        Ok(Self {
            cancel,
            thread: Some(thread),
        })
    }

    /// True once the polling thread has left its loop
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map(|thread| thread.is_finished())
            .unwrap_or(true)
    }

    /// Signals the thread, waits for it and hands the source back.
    ///
    /// Drop the returned source to release the device.
    pub fn stop(mut self) -> Result<StoppedCollector, DeviceError> {
        debug!("Sending stop signal to device stream");
        self.cancel.cancel();

        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| {
                error!("Report collector thread panicked");
                DeviceError::ThreadPanicked
            }),
            None => Err(DeviceError::ThreadPanicked),
        }
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            warn!("Device stream dropped without stop(), joining now");
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}
