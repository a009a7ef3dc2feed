// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::SendError};
use tracing::{instrument, warn};

use crate::event::AuditLogEntry;
use crate::sink::AuditSink;

/// Queued audit dispatcher.
///
/// Events enter a bounded channel; a background task fans each one out to
/// every sink on its own spawned task so a slow sink cannot delay the
/// others.
pub struct AuditService {
	tx: mpsc::Sender<AuditLogEntry>,
}

impl AuditService {
	pub fn new(queue_capacity: usize, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity);

		tokio::spawn(Self::background_task(rx, sinks));

		Self { tx }
	}

	async fn background_task(mut rx: mpsc::Receiver<AuditLogEntry>, sinks: Vec<Arc<dyn AuditSink>>) {
		while let Some(entry) = rx.recv().await {
			let event = Arc::new(entry);

			for sink in &sinks {
				let sink = Arc::clone(sink);
				let event = Arc::clone(&event);

				tokio::spawn(async move {
					if let Err(e) = sink.publish(event).await {
						warn!(sink = sink.name(), error = %e, "audit sink publish failed");
					}
				});
			}
		}
	}

	/// Log an audit event to the queue for processing.
	///
	/// Returns `true` if the event was queued, `false` if the queue was
	/// full and the event was dropped.
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub fn log(&self, entry: AuditLogEntry) -> bool {
		self.tx.try_send(entry).is_ok()
	}

	/// Log an audit event, waiting for queue capacity.
	pub async fn log_blocking(&self, entry: AuditLogEntry) -> Result<(), SendError<AuditLogEntry>> {
		self.tx.send(entry).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEventType;
	use crate::sink::AuditSinkError;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::time::{sleep, Duration};

	struct TestSink {
		name: String,
		publish_count: Arc<AtomicUsize>,
	}

	impl TestSink {
		fn new(name: &str) -> Self {
			Self {
				name: name.to_string(),
				publish_count: Arc::new(AtomicUsize::new(0)),
			}
		}

		fn count(&self) -> usize {
			self.publish_count.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl AuditSink for TestSink {
		fn name(&self) -> &str {
			&self.name
		}

		async fn publish(&self, _event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			self.publish_count.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	struct FailingSink;

	#[async_trait]
	impl AuditSink for FailingSink {
		fn name(&self) -> &str {
			"failing"
		}

		async fn publish(&self, _event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			Err(AuditSinkError::Transient("test error".to_string()))
		}
	}

	#[tokio::test]
	async fn test_log_sends_to_sink() {
		let sink = Arc::new(TestSink::new("test"));
		let service = AuditService::new(10000, vec![Arc::clone(&sink) as Arc<dyn AuditSink>]);

		let entry = AuditLogEntry::builder(AuditEventType::Login).build();
		assert!(service.log(entry));

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.count(), 1);
	}

	#[tokio::test]
	async fn test_log_blocking_sends_to_sink() {
		let sink = Arc::new(TestSink::new("test"));
		let service = AuditService::new(10000, vec![Arc::clone(&sink) as Arc<dyn AuditSink>]);

		let entry = AuditLogEntry::builder(AuditEventType::Login).build();
		service.log_blocking(entry).await.unwrap();

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.count(), 1);
	}

	#[tokio::test]
	async fn test_fan_out_to_multiple_sinks() {
		let sink1 = Arc::new(TestSink::new("sink1"));
		let sink2 = Arc::new(TestSink::new("sink2"));
		let service = AuditService::new(
			10000,
			vec![
				Arc::clone(&sink1) as Arc<dyn AuditSink>,
				Arc::clone(&sink2) as Arc<dyn AuditSink>,
			],
		);

		let entry = AuditLogEntry::builder(AuditEventType::Login).build();
		service.log(entry);

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink1.count(), 1);
		assert_eq!(sink2.count(), 1);
	}

	#[tokio::test]
	async fn test_failing_sink_does_not_block_others() {
		let good_sink = Arc::new(TestSink::new("good"));
		let service = AuditService::new(
			10000,
			vec![
				Arc::new(FailingSink) as Arc<dyn AuditSink>,
				Arc::clone(&good_sink) as Arc<dyn AuditSink>,
			],
		);

		let entry = AuditLogEntry::builder(AuditEventType::Login).build();
		service.log(entry);

		sleep(Duration::from_millis(50)).await;
		assert_eq!(good_sink.count(), 1);
	}
}
