use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

/// Wall-clock timer for one named stage of model loading or a request.
pub struct Timer {
    stage: String,
    started: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
}

impl Timer {
    pub fn new(stage: &str) -> Self {
        Timer {
            stage: stage.to_owned(),
            started: None,
            elapsed: None,
        }
    }

    /// Create a timer that is already running
    pub fn new_start(stage: &str) -> Self {
        let mut t = Timer::new(stage);
        t.start();
        t
    }

    pub fn start(&mut self) {
        debug!("{}: starting", self.stage);

        self.started = Some(Utc::now());
        self.elapsed = None;
    }

    /// Stop the timer and return the elapsed milliseconds.
    ///
    /// Stopping a timer that is not running logs and returns the last
    /// recorded duration.
    pub fn stop(&mut self) -> i64 {
        match self.started.take() {
            None => debug!("{}: not running!", self.stage),
            Some(started) => {
                let d = Utc::now() - started;

                self.elapsed = Some(d);
                info!("{} took {} msec", self.stage, d.num_milliseconds());
            }
        }

        self.elapsed_ms()
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed.map_or(0, |d| d.num_milliseconds())
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_records_elapsed_time() {
        let mut t = Timer::new_start("stage");
        assert!(t.is_running());

        std::thread::sleep(std::time::Duration::from_millis(5));
        let ms = t.stop();

        assert!(!t.is_running());
        assert!(ms >= 5);
        assert_eq!(t.elapsed_ms(), ms);
    }

    #[test]
    fn stopping_an_idle_timer_is_harmless() {
        let mut t = Timer::new("idle");
        assert_eq!(t.stop(), 0);
    }
}
