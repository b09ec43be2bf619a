//! Prometheus metrics for the index server.
//!
//! The `/metrics` endpoint is unauthenticated so Prometheus can scrape it.
//! It exposes aggregate counts only (no titles, authors, or content), but it
//! should still be network-restricted to the scraper.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static ARTICLES_APPENDED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pagechain_articles_appended_total",
        "Total number of articles appended",
    )
    .expect("metric creation failed")
});

pub static PAGES_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pagechain_pages_created_total",
        "Total number of pages created by list creation and appends",
    )
    .expect("metric creation failed")
});

pub static PAGES_REPLACED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pagechain_pages_replaced_total",
        "Total number of whole-page article replacements",
    )
    .expect("metric creation failed")
});

pub static LISTS_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pagechain_lists_deleted_total",
        "Total number of list cascade deletes",
    )
    .expect("metric creation failed")
});

pub static ARTICLES_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pagechain_articles_deleted_total",
        "Total number of articles removed by list cascade deletes",
    )
    .expect("metric creation failed")
});

pub static APPEND_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "pagechain_append_duration_seconds",
            "Time taken to append an article, including lock wait",
        )
        .buckets(vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
    )
    .expect("metric creation failed")
});

pub static INDEX_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pagechain_errors_total",
            "Total request errors by error code",
        ),
        &["code"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests can build several routers in one process.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(ARTICLES_APPENDED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGES_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGES_REPLACED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(LISTS_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ARTICLES_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(APPEND_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INDEX_ERRORS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Count a failed request by its error code.
pub fn record_index_error(code: &str) {
    INDEX_ERRORS.with_label_values(&[code]).inc();
}
