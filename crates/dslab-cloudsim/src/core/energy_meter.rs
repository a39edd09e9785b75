//! Energy meter calculates the host energy consumption.

/// Accumulates the energy consumed by a single host in Wh.
#[derive(Debug, Clone, Default)]
pub struct EnergyMeter {
    energy_consumed: f64,
    current_power: f64,
    prev_time: f64,
}

impl EnergyMeter {
    /// Creates meter which starts measuring at the specified time.
    pub fn new(start_time: f64) -> Self {
        Self {
            energy_consumed: 0.,
            current_power: 0.,
            prev_time: start_time,
        }
    }

    /// Invoked at each tick with the power consumed since the previous update.
    pub fn update(&mut self, time: f64, power: f64) {
        if time > self.prev_time {
            self.energy_consumed += (time - self.prev_time) * power / 3600.;
        }
        self.current_power = power;
        self.prev_time = time;
    }

    /// Returns the power reported at the last update.
    pub fn current_power(&self) -> f64 {
        self.current_power
    }

    /// Returns the total energy consumption in Wh.
    pub fn energy_consumed(&self) -> f64 {
        self.energy_consumed
    }
}
