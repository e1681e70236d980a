mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use latbench::core::QuantileReport;
    use latbench::prelude::*;
    use ntest::timeout;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    #[timeout(10000)]
    async fn requests_feed_the_aggregator() {
        init();
        let (addr, server_samples) = spawn_delay_server(Duration::ZERO).await;

        let config = RunConfig::new(workers(4), 50)
            .workload(WorkloadKind::NetworkRequest)
            .timeout(Duration::from_secs(2))
            .target(&format!("http://{addr}/bench"))
            .unwrap();

        let out = SharedBuf::default();
        let summary = Dispatcher::new(config, WriterEmitter::new(out.clone()))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.operations, 50);
        assert_eq!(summary.emitted, 50);
        assert_eq!(summary.failed, 0);
        assert_eq!(server_samples.len(), 50);

        let mut report_out = Vec::new();
        let report = quartiles::aggregate(&out.contents()[..], &mut report_out).unwrap();

        assert_eq!(report.count, 50);
        assert!(report.p00 <= report.p50);
        assert!(report.p50 <= report.p100);

        // Nothing but samples went through the emitter, so only the report is printed.
        let printed = String::from_utf8(report_out).unwrap();
        assert!(printed.starts_with("N: 50 \nP100: "));
        assert_eq!(printed.lines().count(), 8);
    }

    #[tokio::test]
    #[timeout(10000)]
    async fn interleaved_output_is_echoed() {
        init();

        let config = RunConfig::new(workers(3), 10).workload(WorkloadKind::AllocOnly);
        let out = SharedBuf::default();
        let summary = Dispatcher::new(config, WriterEmitter::new(out.clone()))
            .run()
            .await
            .unwrap();
        assert_eq!(summary.emitted, 10);

        let mut input = b"starting run\n".to_vec();
        input.extend(out.contents());
        input.extend(b"run finished\n");

        let mut report_out = Vec::new();
        let report = quartiles::aggregate(&input[..], &mut report_out).unwrap();
        assert_eq!(report.count, 10);

        let printed = String::from_utf8(report_out).unwrap();
        assert!(printed.starts_with("starting run\nrun finished\nN: 10 \n"));
    }

    #[tokio::test]
    #[timeout(10000)]
    async fn slow_target_times_out() {
        init();
        let (addr, _) = spawn_delay_server(Duration::from_millis(500)).await;

        let config = RunConfig::new(workers(2), 4)
            .workload(WorkloadKind::NetworkRequest)
            .timeout(Duration::from_millis(50))
            .target(&format!("http://{addr}/"))
            .unwrap();

        let emitter = MemoryEmitter::new();
        let summary = Dispatcher::new(config, emitter.clone()).run().await.unwrap();

        assert_eq!(summary.failed, 4);
        assert_eq!(summary.suppressed, 4);
        assert_eq!(summary.emitted, 0);
        assert!(emitter.is_empty());
    }

    #[tokio::test]
    #[timeout(10000)]
    async fn slow_target_samples_can_be_kept() {
        init();
        let (addr, _) = spawn_delay_server(Duration::from_millis(500)).await;

        let config = RunConfig::new(workers(2), 4)
            .workload(WorkloadKind::NetworkRequest)
            .timeout(Duration::from_millis(50))
            .failed_samples(FailedSamples::Include)
            .target(&format!("http://{addr}/"))
            .unwrap();

        let emitter = MemoryEmitter::new();
        let summary = Dispatcher::new(config, emitter.clone()).run().await.unwrap();

        assert_eq!(summary.failed, 4);
        assert_eq!(summary.emitted, 4);
        for sample in emitter.samples() {
            assert!(sample.as_duration() >= Duration::from_millis(50));
            assert!(sample.as_duration() < Duration::from_millis(500));
        }
    }

    #[tokio::test]
    #[timeout(10000)]
    async fn delayed_target_latency() {
        init();
        let (addr, _) = spawn_delay_server(Duration::from_millis(20)).await;

        let config = RunConfig::new(workers(5), 20)
            .workload(WorkloadKind::NetworkRequest)
            .timeout(Duration::from_secs(2))
            .target(&format!("http://{addr}/"))
            .unwrap();

        let emitter = MemoryEmitter::new();
        Dispatcher::new(config, emitter.clone()).run().await.unwrap();

        let mut samples = emitter.samples();
        let report = QuantileReport::from_samples(&mut samples);

        assert_eq!(report.count, 20);
        assert!(report.p00.as_duration() >= Duration::from_millis(20));
    }
}
