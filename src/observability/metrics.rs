use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub status_transitions_total: IntCounterVec,
    pub dispatch_operations_total: IntCounterVec,
    pub dispatch_operation_seconds: HistogramVec,
    pub verification_checks_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Committed package status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid status_transitions_total metric");

        let dispatch_operations_total = IntCounterVec::new(
            Opts::new(
                "dispatch_operations_total",
                "Dispatch operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid dispatch_operations_total metric");

        let dispatch_operation_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_operation_seconds",
                "Latency of dispatch operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid dispatch_operation_seconds metric");

        let verification_checks_total = IntCounterVec::new(
            Opts::new(
                "verification_checks_total",
                "Collection/drop-off code checks by kind and result",
            ),
            &["kind", "result"],
        )
        .expect("valid verification_checks_total metric");

        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(dispatch_operations_total.clone()))
            .expect("register dispatch_operations_total");
        registry
            .register(Box::new(dispatch_operation_seconds.clone()))
            .expect("register dispatch_operation_seconds");
        registry
            .register(Box::new(verification_checks_total.clone()))
            .expect("register verification_checks_total");

        Self {
            registry,
            status_transitions_total,
            dispatch_operations_total,
            dispatch_operation_seconds,
            verification_checks_total,
        }
    }

    pub fn record_operation(&self, operation: &str, succeeded: bool, elapsed_secs: f64) {
        let outcome = if succeeded { "success" } else { "error" };
        self.dispatch_operations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.dispatch_operation_seconds
            .with_label_values(&[operation])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
