use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ==== Plate Recognition Metrics ====
    pub static ref PLATE_RECOGNITIONS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "plate_recognitions_total",
                "Total number of plate recognition calls",
            ),
            &["mode", "outcome"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref PLATE_RECOGNITION_LATENCY: HistogramVec = {
        let metric = HistogramVec::new(
            HistogramOpts::new(
                "plate_recognition_latency_seconds",
                "Latency of plate recognition, annotation call included",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["mode"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Annotation Provider Metrics ====
    pub static ref ANNOTATION_PROVIDER_REQUESTS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "annotation_provider_requests_total",
                "Total number of requests sent to image annotation providers",
            ),
            &["provider", "status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Plugin Metrics ====
    pub static ref AI_SERVICE_FRAMES_PROCESSED: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "ai_service_frames_processed_total",
                "Total number of frames processed",
            ),
            &["plugin_type", "status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_registered() {
        PLATE_RECOGNITIONS
            .with_label_values(&["geometric", "detected"])
            .inc();
        ANNOTATION_PROVIDER_REQUESTS
            .with_label_values(&["static", "success"])
            .inc();

        let names: Vec<String> = REGISTRY
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();

        assert!(names.contains(&"plate_recognitions_total".to_string()));
        assert!(names.contains(&"annotation_provider_requests_total".to_string()));
    }
}
