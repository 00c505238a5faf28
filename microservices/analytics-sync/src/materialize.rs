//! Materializer
//!
//! Turns a cycle's summaries into keyed, whole-document upserts and submits
//! them to the document store as one batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrica_core::{MetricDocument, MetricSummary};
use metrica_store::{Document, DocumentCollection, StoreClient, StoreConfig};
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};

/// Batch upsert-by-key target
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Create-or-replace every document, matched on `metric`.
    /// Returns the number of documents written.
    async fn upsert_batch(&self, documents: &[MetricDocument]) -> Result<u64>;
}

pub struct Materializer<S> {
    sink: S,
}

impl<S: DocumentSink> Materializer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Materialize one cycle's summaries, stamping every document with `now`.
    ///
    /// An empty input is a valid outcome: nothing is sent to the sink.
    #[instrument(skip(self, summaries), fields(metrics = summaries.len()))]
    pub async fn materialize(&self, summaries: &[MetricSummary], now: DateTime<Utc>) -> Result<u64> {
        if summaries.is_empty() {
            debug!("No summaries, skipping write");
            return Ok(0);
        }

        let documents: Vec<MetricDocument> = summaries
            .iter()
            .map(|summary| MetricDocument::from_summary(summary, now))
            .collect();

        self.sink.upsert_batch(&documents).await
    }
}

/// Document sink over a JSONB collection
pub struct PgDocumentSink {
    config: StoreConfig,
    collection: DocumentCollection,
}

impl PgDocumentSink {
    pub fn new(config: StoreConfig, collection: DocumentCollection) -> Self {
        Self { config, collection }
    }
}

#[async_trait]
impl DocumentSink for PgDocumentSink {
    #[instrument(skip(self, documents), fields(collection = %self.collection.name()))]
    async fn upsert_batch(&self, documents: &[MetricDocument]) -> Result<u64> {
        let batch = documents
            .iter()
            .map(|doc| Document::from_serialize(doc.id(), doc, doc.updated_at))
            .collect::<metrica_store::Result<Vec<_>>>()
            .map_err(|e| SyncError::SinkUnavailable(e.to_string()))?;

        let mut client = StoreClient::connect(&self.config)
            .await
            .map_err(|e| SyncError::SinkUnavailable(e.to_string()))?;

        self.collection
            .upsert_all(&mut client, &batch)
            .await
            .map_err(|e| SyncError::SinkUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySink;
    use chrono::TimeZone;
    use metrica_store::Endpoint;
    use tokio_test::{assert_err, assert_ok};

    fn summary(metric: &str, min: f64, max: f64, avg: f64, count: u64) -> MetricSummary {
        MetricSummary {
            metric: metric.into(),
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
            count,
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap()
    }

    #[tokio::test]
    async fn test_one_document_per_summary() {
        let sink = MemorySink::default();
        let materializer = Materializer::new(sink.clone());
        let summaries = vec![
            summary("temp", 10.0, 20.0, 15.0, 2),
            summary("grade", 90.0, 90.0, 90.0, 1),
        ];

        let written = assert_ok!(materializer.materialize(&summaries, at(0)).await);
        assert_eq!(written, 2);

        let temp = sink.get("temp").unwrap();
        assert_eq!((temp.min, temp.max, temp.avg, temp.count), (Some(10.0), Some(20.0), Some(15.0), 2));
        assert_eq!(temp.updated_at, at(0));
        let grade = sink.get("grade").unwrap();
        assert_eq!((grade.min, grade.max, grade.avg, grade.count), (Some(90.0), Some(90.0), Some(90.0), 1));
        assert_eq!(sink.batches(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_write_call() {
        let sink = MemorySink::default();
        let materializer = Materializer::new(sink.clone());

        let written = assert_ok!(materializer.materialize(&[], at(0)).await);
        assert_eq!(written, 0);
        assert_eq!(sink.batches(), 0);
    }

    #[tokio::test]
    async fn test_rematerializing_is_idempotent() {
        let sink = MemorySink::default();
        let materializer = Materializer::new(sink.clone());
        let summaries = vec![summary("temp", 10.0, 20.0, 15.0, 2)];

        materializer.materialize(&summaries, at(0)).await.unwrap();
        let first = sink.get("temp").unwrap();
        materializer.materialize(&summaries, at(10)).await.unwrap();
        materializer.materialize(&summaries, at(20)).await.unwrap();
        let last = sink.get("temp").unwrap();

        assert!(first.same_values(&last));
        assert_eq!(last.updated_at, at(20));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_null_aggregates_pass_through() {
        let sink = MemorySink::default();
        let materializer = Materializer::new(sink.clone());
        let empty_group = MetricSummary {
            metric: "pressure".into(),
            min: None,
            max: None,
            avg: None,
            count: 0,
        };

        materializer.materialize(&[empty_group], at(0)).await.unwrap();

        let doc = sink.get("pressure").unwrap();
        assert_eq!((doc.min, doc.max, doc.avg), (None, None, None));
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("min").is_some_and(|v| v.is_null()));
        assert!(json.get("avg").is_some_and(|v| v.is_null()));
    }

    #[tokio::test]
    async fn test_sink_failure_leaves_documents_untouched() {
        let sink = MemorySink::default();
        let materializer = Materializer::new(sink.clone());
        materializer
            .materialize(&[summary("temp", 1.0, 1.0, 1.0, 1)], at(0))
            .await
            .unwrap();

        sink.fail_next(1);
        let err = assert_err!(
            materializer
                .materialize(&[summary("temp", 5.0, 9.0, 7.0, 3)], at(10))
                .await
        );
        assert!(matches!(err, SyncError::SinkUnavailable(_)));

        let doc = sink.get("temp").unwrap();
        assert_eq!(doc.count, 1);
        assert_eq!(doc.updated_at, at(0));
    }

    #[tokio::test]
    async fn test_unreachable_document_store_is_sink_unavailable() {
        let sink = PgDocumentSink::new(
            StoreConfig::new(Endpoint::Url("postgres://metrica@127.0.0.1:1/metrica".into())),
            DocumentCollection::new("analytics").unwrap(),
        );
        let materializer = Materializer::new(sink);
        let err = materializer
            .materialize(&[summary("temp", 1.0, 1.0, 1.0, 1)], at(0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::SinkUnavailable(_)));
    }
}
