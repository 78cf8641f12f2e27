//! Processing metrics and the job exposing them

use crate::domain::event::ProcessingStage;
use crate::library::EmptyResult;
use async_trait::async_trait;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use jatsl::{Job, JobManager};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{info, warn};

lazy_static! {
    pub(crate) static ref RECORDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "patchline_ingest_records_total",
        "Number of fully handled inbound records by outcome",
        &["outcome"]
    )
    .unwrap();
    pub(crate) static ref DEAD_LETTERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "patchline_ingest_dead_letters_total",
        "Number of records parked on the dead letter stream by failure stage",
        &["stage"]
    )
    .unwrap();
    pub(crate) static ref SINK_FALLBACKS_TOTAL: IntCounter = register_int_counter!(
        "patchline_ingest_sink_fallbacks_total",
        "Number of dead letters that could not be published and went to the log instead"
    )
    .unwrap();
    pub(crate) static ref PARTITIONS_HALTED_TOTAL: IntCounter = register_int_counter!(
        "patchline_ingest_partitions_halted_total",
        "Number of partitions on which consumption halted after publish exhaustion"
    )
    .unwrap();
    pub(crate) static ref COMMIT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "patchline_ingest_commit_failures_total",
        "Number of failed consumption progress commits"
    )
    .unwrap();
    pub(crate) static ref HANDLING_DURATION_SECONDS: Histogram = register_histogram!(
        "patchline_ingest_handling_duration_seconds",
        "Wall clock time spent handling a single inbound record"
    )
    .unwrap();
}

pub(crate) fn observe_success() {
    RECORDS_TOTAL.with_label_values(&["success"]).inc();
}

pub(crate) fn observe_failure(stage: ProcessingStage) {
    let outcome = match stage {
        ProcessingStage::Decode => "error-decode",
        ProcessingStage::Resolve => "error-resolve",
        ProcessingStage::Extract => "error-extract",
        ProcessingStage::Publish => "error-publish",
    };

    RECORDS_TOTAL.with_label_values(&[outcome]).inc();
}

fn metrics_response() -> Response<Body> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => {
            let mut response = Response::new(Body::from(buffer));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(error) => {
            warn!(?error, "Failed to encode metrics");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

async fn handle(request: Request<Body>) -> Result<Response<Body>, Infallible> {
    let response = match (request.method(), request.uri().path()) {
        (&Method::GET, "/metrics") => metrics_response(),
        _ => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    };

    Ok(response)
}

/// Job serving the collected metrics in Prometheus exposition format
pub struct MetricsExporterJob {
    port: u16,
}

impl MetricsExporterJob {
    /// Creates a new job listening on the given port
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl Job for MetricsExporterJob {
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let make_svc = make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(handle)) });

        let server = Server::try_bind(&addr)?.serve(make_svc);
        let graceful = server.with_graceful_shutdown(manager.termination_signal());

        info!(?addr, "Serving metrics");
        manager.ready().await;

        graceful.await?;

        Ok(())
    }
}
