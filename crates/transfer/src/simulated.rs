//! In-process transport that fakes uploads on a timer.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use filedrop_protocol::{RawFile, UploadResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::TransferError;
use crate::transport::{ProgressCallback, TransferFuture, UploadTransport};

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const HISTORY_DELAY: Duration = Duration::from_millis(300);
const DELETE_DELAY: Duration = Duration::from_millis(200);

/// Tuning for [`SimulatedTransport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of progress steps; `steps + 1` callbacks are emitted.
    pub steps: u32,
    /// Lower bound of the per-file step delay.
    pub min_delay_ms: u64,
    /// Upper bound of the per-file step delay.
    pub max_delay_ms: u64,
    /// Probability of a network failure at each eligible step.
    pub failure_rate: f64,
    /// Steps `0..=failure_free_steps` never fail.
    pub failure_free_steps: u32,
    /// Probability that a delete request fails.
    pub delete_failure_rate: f64,
    /// Prefix of the URL reported for stored files.
    pub base_url: String,
    /// Fixed RNG seed for reproducible runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            min_delay_ms: 100,
            max_delay_ms: 300,
            failure_rate: 0.05,
            failure_free_steps: 5,
            delete_failure_rate: 0.1,
            base_url: "https://example.com/files".into(),
            seed: None,
        }
    }
}

/// Fake backend: progress on a timer, random failures, in-memory history.
pub struct SimulatedTransport {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
    uploaded: Mutex<Vec<UploadResult>>,
}

impl SimulatedTransport {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn uploaded(&self) -> MutexGuard<'_, Vec<UploadResult>> {
        self.uploaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step delay for one file, drawn once and reused for every step.
    fn roll_delay(&self) -> Duration {
        let min = self.config.min_delay_ms.min(self.config.max_delay_ms);
        let max = self.config.max_delay_ms.max(min);
        Duration::from_millis(self.rng().gen_range(min..=max))
    }

    /// A NaN probability never fires.
    fn roll(&self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        self.rng().gen_bool(probability.clamp(0.0, 1.0))
    }

    fn token(&self, len: usize) -> String {
        let mut rng = self.rng();
        (0..len)
            .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }

    fn stored_result(&self, file: &RawFile) -> UploadResult {
        let now = Utc::now();
        UploadResult {
            id: format!("uploaded_{}_{}", now.timestamp_millis(), self.token(9)),
            original_name: file.name.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            uploaded_at: now,
            url: format!("{}/{}", self.config.base_url.trim_end_matches('/'), file.name),
            checksum: self.token(16),
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl UploadTransport for SimulatedTransport {
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        on_progress: ProgressCallback<'a>,
    ) -> TransferFuture<'a, UploadResult> {
        Box::pin(async move {
            let steps = self.config.steps.max(1);
            let delay = self.roll_delay();
            let secs = steps as f64 * delay.as_secs_f64();
            let speed = if secs > 0.0 { file.size as f64 / secs } else { 0.0 };

            debug!(file = %file.name, delay_ms = delay.as_millis() as u64, "simulated upload started");

            for step in 0..=steps {
                tokio::time::sleep(delay).await;
                on_progress(step as f64 / steps as f64 * 100.0, speed);

                let eligible = step > self.config.failure_free_steps && step < steps;
                if eligible && self.roll(self.config.failure_rate) {
                    warn!(file = %file.name, step, "simulated network failure");
                    return Err(TransferError::Network);
                }
            }

            let result = self.stored_result(file);
            self.uploaded().push(result.clone());
            debug!(file = %file.name, id = %result.id, "simulated upload finished");
            Ok(result)
        })
    }

    fn history(&self) -> TransferFuture<'_, Vec<UploadResult>> {
        Box::pin(async move {
            tokio::time::sleep(HISTORY_DELAY).await;
            let history = self.uploaded().clone();
            Ok(history)
        })
    }

    fn delete<'a>(&'a self, upload_id: &'a str) -> TransferFuture<'a, ()> {
        Box::pin(async move {
            tokio::time::sleep(DELETE_DELAY).await;

            if self.roll(self.config.delete_failure_rate) {
                warn!(id = %upload_id, "simulated delete failure");
                return Err(TransferError::DeleteFailed);
            }

            let mut uploaded = self.uploaded();
            let before = uploaded.len();
            uploaded.retain(|r| r.id != upload_id);
            if uploaded.len() == before {
                return Err(TransferError::NotFound(upload_id.to_string()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(failure_rate: f64) -> SimulatedTransport {
        SimulatedTransport::new(SimulationConfig {
            min_delay_ms: 200,
            max_delay_ms: 200,
            failure_rate,
            delete_failure_rate: 0.0,
            seed: Some(7),
            ..SimulationConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn successful_upload_emits_21_steps() {
        let transport = fixed(0.0);
        let file = RawFile::new("report.pdf", 4000, "application/pdf");
        let seen = Mutex::new(Vec::new());
        let cb = |p: f64, s: f64| seen.lock().unwrap().push((p, s));

        let start = tokio::time::Instant::now();
        let result = transport.upload(&file, &cb).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(21 * 200));

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 21);
        assert_eq!(seen[0].0, 0.0);
        assert_eq!(seen[10].0, 50.0);
        assert_eq!(seen[20].0, 100.0);
        // 4000 bytes over 20 * 0.2 s.
        assert!(seen.iter().all(|&(_, s)| (s - 1000.0).abs() < 1e-9));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));

        assert_eq!(result.original_name, "report.pdf");
        assert_eq!(result.size, 4000);
        assert_eq!(result.mime_type, "application/pdf");
        assert_eq!(result.url, "https://example.com/files/report.pdf");
        assert_eq!(result.checksum.len(), 16);
        assert!(result.id.starts_with("uploaded_"));
    }

    #[tokio::test(start_paused = true)]
    async fn certain_failure_hits_first_eligible_step() {
        let transport = fixed(1.0);
        let file = RawFile::new("clip.mp4", 1000, "video/mp4");
        let seen = Mutex::new(Vec::new());
        let cb = |p: f64, s: f64| seen.lock().unwrap().push((p, s));

        let err = transport.upload(&file, &cb).await.unwrap_err();
        assert!(matches!(err, TransferError::Network));
        assert_eq!(err.to_string(), "Network error occurred");

        // Steps 0..=6 were reported, then nothing.
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.last().unwrap().0, 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn random_delay_is_drawn_once_per_file() {
        let transport = SimulatedTransport::new(SimulationConfig {
            failure_rate: 0.0,
            seed: Some(11),
            ..SimulationConfig::default()
        });
        let file = RawFile::new("notes.txt", 20_000, "text/plain");

        for _ in 0..5 {
            let seen = Mutex::new(Vec::new());
            let cb = |p: f64, s: f64| seen.lock().unwrap().push((p, s));

            let start = tokio::time::Instant::now();
            transport.upload(&file, &cb).await.unwrap();
            let elapsed = start.elapsed();

            let seen = seen.into_inner().unwrap();
            assert_eq!(seen.len(), 21);
            let speed = seen[0].1;
            assert!(seen.iter().all(|&(_, s)| s == speed));

            // Every step slept the same delay, somewhere in 100..=300 ms.
            let step = elapsed / 21;
            assert!(step >= Duration::from_millis(100) && step <= Duration::from_millis(300));
            let expected = 20_000.0 / (20.0 * step.as_secs_f64());
            assert!((speed - expected).abs() / expected < 0.01);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn nan_failure_rate_never_fails() {
        let config: SimulationConfig =
            toml::from_str("failure_rate = nan\ndelete_failure_rate = nan\nseed = 5").unwrap();
        assert!(config.failure_rate.is_nan());

        let transport = SimulatedTransport::new(config);
        let noop = |_: f64, _: f64| {};
        let result = transport
            .upload(&RawFile::new("a.txt", 10, "text/plain"), &noop)
            .await
            .unwrap();
        transport.delete(&result.id).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn delay_stays_in_configured_range() {
        let transport = SimulatedTransport::new(SimulationConfig {
            failure_rate: 0.0,
            seed: Some(1),
            ..SimulationConfig::default()
        });
        for _ in 0..50 {
            let d = transport.roll_delay();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn history_and_delete() {
        let transport = fixed(0.0);
        let noop = |_: f64, _: f64| {};
        let a = transport
            .upload(&RawFile::new("a.txt", 10, "text/plain"), &noop)
            .await
            .unwrap();
        let b = transport
            .upload(&RawFile::new("b.txt", 20, "text/plain"), &noop)
            .await
            .unwrap();

        let history = transport.history().await.unwrap();
        assert_eq!(history, vec![a.clone(), b.clone()]);

        transport.delete(&a.id).await.unwrap();
        let history = transport.history().await.unwrap();
        assert_eq!(history, vec![b]);

        let err = transport.delete(&a.id).await.unwrap_err();
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_can_fail() {
        let transport = SimulatedTransport::new(SimulationConfig {
            delete_failure_rate: 1.0,
            ..SimulationConfig::default()
        });
        let err = transport.delete("uploaded_1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to delete file");
    }

    #[test]
    fn config_partial_toml() {
        let config: SimulationConfig = toml::from_str("failure_rate = 0.0\nseed = 3").unwrap();
        assert_eq!(config.failure_rate, 0.0);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.steps, 20);
        assert_eq!(config.max_delay_ms, 300);
    }

    #[test]
    fn seeded_tokens_are_reproducible() {
        let a = fixed(0.0);
        let b = fixed(0.0);
        assert_eq!(a.token(16), b.token(16));
    }
}
