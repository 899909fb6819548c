//! Ritmo do loop de captura
//!
//! Taxa fixa: o próximo tick é marcado a partir do anterior, não do fim da
//! leitura. Se o loop atrasar mais de dois intervalos, os ticks perdidos são
//! contados e o ritmo recomeça do instante atual. Intervalo zero significa
//! ler tão rápido quanto a fonte entrega: não há espera nem tick perdido.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    last_tick: Option<Instant>,
    tick_count: u64,
    missed_ticks: u64,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            tick_count: 0,
            missed_ticks: 0,
        }
    }

    pub fn with_rate_hz(rate_hz: f64) -> Self {
        let rate_hz = if rate_hz > 0.0 { rate_hz } else { 1.0 };
        Self::new(Duration::from_secs_f64(1.0 / rate_hz))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Marca um tick e retorna quanto esperar até o próximo
    pub fn until_next_tick(&mut self) -> Duration {
        let now = Instant::now();

        if self.interval.is_zero() {
            self.last_tick = Some(now);
            self.tick_count = self.tick_count.saturating_add(1);
            return Duration::ZERO;
        }

        let next = match self.last_tick {
            Some(last) => {
                let elapsed = now.duration_since(last);
                if elapsed > self.interval * 2 {
                    let missed = (elapsed.as_secs_f64() / self.interval.as_secs_f64()) as u64;
                    self.missed_ticks = self.missed_ticks.saturating_add(missed.saturating_sub(1));
                    now
                } else {
                    last + self.interval
                }
            }
            None => now,
        };

        self.last_tick = Some(next);
        self.tick_count = self.tick_count.saturating_add(1);
        (next + self.interval).saturating_duration_since(now)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn missed_ticks(&self) -> u64 {
        self.missed_ticks
    }
}
