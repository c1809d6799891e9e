//! Sampler tests against mock host probes and EC2 lookups

#[cfg(test)]
mod mock_probe_tests {
    use crate::collector::{
        cpu_percent_value, fullest_disk_percent, CreditSampler, HostProbe, Sampler,
    };
    use crate::cloud::{CreditBalanceSource, InstanceMetadata};
    use crate::models::{FilesystemUsage, UsageCounters};
    use crate::observability::StructuredLogger;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    fn logger() -> StructuredLogger {
        StructuredLogger::new("test-host", "v-test")
    }

    fn fs(device: &str, total: u64, available: u64) -> FilesystemUsage {
        FilesystemUsage {
            device: device.to_string(),
            mount_point: format!("/mnt/{}", device.trim_start_matches("/dev/")),
            total_bytes: total,
            available_bytes: available,
        }
    }

    /// Probe returning fixed readings
    struct FixedProbe;

    #[async_trait]
    impl HostProbe for FixedProbe {
        async fn cpu_percent(&self) -> Result<f64> {
            Ok(12.9)
        }

        async fn memory(&self) -> Result<UsageCounters> {
            Ok(UsageCounters::new(3 * 1024, 4 * 1024))
        }

        async fn swap(&self) -> Result<UsageCounters> {
            Ok(UsageCounters::new(0, 0))
        }

        async fn filesystems(&self) -> Result<Vec<FilesystemUsage>> {
            Ok(vec![
                fs("/dev/sda1", 100, 60),
                fs("/dev/sdb1", 100, 10),
                fs("tmpfs", 100, 0),
            ])
        }
    }

    /// Probe whose every query fails
    struct FailingProbe;

    #[async_trait]
    impl HostProbe for FailingProbe {
        async fn cpu_percent(&self) -> Result<f64> {
            anyhow::bail!("top exited with status 1")
        }

        async fn memory(&self) -> Result<UsageCounters> {
            anyhow::bail!("unparsable meminfo")
        }

        async fn swap(&self) -> Result<UsageCounters> {
            anyhow::bail!("unparsable meminfo")
        }

        async fn filesystems(&self) -> Result<Vec<FilesystemUsage>> {
            anyhow::bail!("df exited with status 1")
        }
    }

    /// Probe returning values no sane host reports
    struct GarbageProbe;

    #[async_trait]
    impl HostProbe for GarbageProbe {
        async fn cpu_percent(&self) -> Result<f64> {
            Ok(f64::NAN)
        }

        async fn memory(&self) -> Result<UsageCounters> {
            Ok(UsageCounters::new(10, 0))
        }

        async fn swap(&self) -> Result<UsageCounters> {
            Ok(UsageCounters::new(u64::MAX, 0))
        }

        async fn filesystems(&self) -> Result<Vec<FilesystemUsage>> {
            Ok(vec![fs("/dev/sda1", 0, 0)])
        }
    }

    /// Probe that never answers
    struct HangingProbe;

    #[async_trait]
    impl HostProbe for HangingProbe {
        async fn cpu_percent(&self) -> Result<f64> {
            std::future::pending().await
        }

        async fn memory(&self) -> Result<UsageCounters> {
            std::future::pending().await
        }

        async fn swap(&self) -> Result<UsageCounters> {
            std::future::pending().await
        }

        async fn filesystems(&self) -> Result<Vec<FilesystemUsage>> {
            std::future::pending().await
        }
    }

    struct MockMetadata {
        instance_id: Option<&'static str>,
        instance_type: Option<&'static str>,
    }

    #[async_trait]
    impl InstanceMetadata for MockMetadata {
        async fn instance_id(&self) -> Result<String> {
            self.instance_id
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("metadata service unreachable"))
        }

        async fn instance_type(&self) -> Result<String> {
            self.instance_type
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("metadata service unreachable"))
        }
    }

    struct MockBalance(Result<Option<f64>, &'static str>);

    #[async_trait]
    impl CreditBalanceSource for MockBalance {
        async fn minimum_balance(&self, instance_id: &str) -> Result<Option<f64>> {
            assert_eq!(instance_id, "i-0123");
            self.0.map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn credit_sampler(
        instance_id: Option<&'static str>,
        instance_type: Option<&'static str>,
        balance: Result<Option<f64>, &'static str>,
    ) -> CreditSampler {
        CreditSampler::new(
            Arc::new(MockMetadata {
                instance_id,
                instance_type,
            }),
            Arc::new(MockBalance(balance)),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_fixed_probe_samples() {
        let sampler = Sampler::new(Arc::new(FixedProbe), Duration::from_secs(5), logger());
        let samples = sampler.sample_all().await;

        assert_eq!(samples.cpu, 12);
        assert_eq!(samples.memory, 75);
        assert_eq!(samples.swap, 0);
        // sdb1 is the fullest block device; tmpfs is ignored
        assert_eq!(samples.disk, 90);
        assert_eq!(samples.credit, None);
    }

    #[tokio::test]
    async fn test_failing_probe_yields_zero() {
        let sampler = Sampler::new(Arc::new(FailingProbe), Duration::from_secs(5), logger());

        assert_eq!(sampler.cpu().await, 0);
        assert_eq!(sampler.memory().await, 0);
        assert_eq!(sampler.swap().await, 0);
        assert_eq!(sampler.fullest_disk().await, 0);
    }

    #[tokio::test]
    async fn test_garbage_readings_yield_zero() {
        let sampler = Sampler::new(Arc::new(GarbageProbe), Duration::from_secs(5), logger());
        let samples = sampler.sample_all().await;

        assert_eq!(samples.cpu, 0);
        assert_eq!(samples.memory, 0);
        assert_eq!(samples.swap, 0);
        assert_eq!(samples.disk, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_times_out_to_zero() {
        let sampler = Sampler::new(Arc::new(HangingProbe), Duration::from_secs(5), logger());
        let samples = sampler.sample_all().await;

        assert_eq!(samples.cpu, 0);
        assert_eq!(samples.memory, 0);
        assert_eq!(samples.swap, 0);
        assert_eq!(samples.disk, 0);
    }

    #[tokio::test]
    async fn test_credit_percent() {
        // t2.micro ceiling is 144 credits
        let credit = credit_sampler(Some("i-0123"), Some("t2.micro"), Ok(Some(72.0)));
        assert_eq!(credit.sample(&logger()).await, 50);
    }

    #[tokio::test]
    async fn test_credit_unknown_instance_type() {
        let credit = credit_sampler(Some("i-0123"), Some("m5.large"), Ok(Some(72.0)));
        assert_eq!(credit.credit_percent().await.unwrap(), 0);
        assert_eq!(credit.sample(&logger()).await, 0);
    }

    #[tokio::test]
    async fn test_credit_no_datapoint() {
        let credit = credit_sampler(Some("i-0123"), Some("t3.micro"), Ok(None));
        assert_eq!(credit.sample(&logger()).await, 0);
    }

    #[tokio::test]
    async fn test_credit_identity_failure() {
        let credit = credit_sampler(None, Some("t3.micro"), Ok(Some(10.0)));
        assert!(credit.credit_percent().await.is_err());
        assert_eq!(credit.sample(&logger()).await, 0);
    }

    #[tokio::test]
    async fn test_credit_query_failure() {
        let credit = credit_sampler(Some("i-0123"), Some("t3.micro"), Err("aws exited with 255"));
        assert_eq!(credit.sample(&logger()).await, 0);
    }

    #[tokio::test]
    async fn test_credit_type_lookup_failure() {
        let credit = credit_sampler(Some("i-0123"), None, Ok(Some(10.0)));
        assert_eq!(credit.sample(&logger()).await, 0);
    }

    #[tokio::test]
    async fn test_sample_all_with_credit() {
        let sampler = Sampler::new(Arc::new(FixedProbe), Duration::from_secs(5), logger())
            .with_credit(credit_sampler(Some("i-0123"), Some("t2.nano"), Ok(Some(18.0))));

        assert!(sampler.credit_enabled());
        let samples = sampler.sample_all().await;
        // t2.nano ceiling is 72 credits
        assert_eq!(samples.credit, Some(25));
    }

    #[test]
    fn test_fullest_disk_ignores_pseudo_filesystems() {
        let filesystems = vec![fs("overlay", 100, 1), fs("/dev/root", 100, 55)];
        assert_eq!(fullest_disk_percent(&filesystems), 45);
        assert_eq!(fullest_disk_percent(&[]), 0);
    }

    #[test]
    fn test_cpu_percent_value() {
        assert_eq!(cpu_percent_value(37.8), 37);
        assert_eq!(cpu_percent_value(-1.0), 0);
        assert_eq!(cpu_percent_value(f64::INFINITY), 0);
        assert_eq!(cpu_percent_value(100.4), 100);
    }
}
