use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionTimings {
    pub load_ms: f64,
    pub open_ms: f64,
    pub render_ms: f64,
    pub encode_ms: f64,
    pub open_attempts: u32,
}

impl ConversionTimings {
    pub fn record_load(&mut self, elapsed: Duration) {
        self.load_ms = to_millis(elapsed);
    }

    pub fn record_open(&mut self, elapsed: Duration, attempts: u32) {
        self.open_ms = to_millis(elapsed);
        self.open_attempts = attempts;
    }

    pub fn record_render(&mut self, elapsed: Duration) {
        self.render_ms = to_millis(elapsed);
    }

    pub fn record_encode(&mut self, elapsed: Duration) {
        self.encode_ms = to_millis(elapsed);
    }

    pub fn total_ms(&self) -> f64 {
        self.load_ms + self.open_ms + self.render_ms + self.encode_ms
    }
}

fn to_millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
