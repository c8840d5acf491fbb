//! PWM peripheral abstraction
//!
//! The driver only needs three things from the hardware: configure a
//! timer/channel pair, write a duty value, and report the duty ceiling.
//! [`SimulatedLedc`] stands in for the ESP32 LEDC block on the host. It
//! enforces the same configuration limits and keeps the most recent committed
//! duties so tests can inspect what reached the "pin".

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use crate::error::PwmError;
use crate::types::PwmTimerConfig;

/// LEDC source clock (APB, 80 MHz)
pub const LEDC_SOURCE_CLOCK_HZ: u64 = 80_000_000;

/// Widest duty resolution the LEDC timers support
pub const LEDC_MAX_RESOLUTION_BITS: u8 = 20;

/// Latched duties kept by a [`SimulatedLedc`]
pub const LEDC_HISTORY_CAPACITY: usize = 1024;

/// A single PWM output channel
pub trait PwmChannel: Send {
    /// Configures timer and channel; duty starts at 0
    fn configure(&mut self, config: &PwmTimerConfig) -> Result<(), PwmError>;

    /// Sets and latches a new duty value
    fn set_duty(&mut self, duty: u32) -> Result<(), PwmError>;

    /// Largest duty value accepted by `set_duty`
    fn max_duty(&self) -> u32;
}

impl<T: PwmChannel + ?Sized> PwmChannel for Box<T> {
    fn configure(&mut self, config: &PwmTimerConfig) -> Result<(), PwmError> {
        (**self).configure(config)
    }

    fn set_duty(&mut self, duty: u32) -> Result<(), PwmError> {
        (**self).set_duty(duty)
    }

    fn max_duty(&self) -> u32 {
        (**self).max_duty()
    }
}

/// Register snapshot of a simulated channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedcRegisters {
    pub config: Option<PwmTimerConfig>,
    pub duty: u32,
    /// Most recent latched duties, oldest first, at most
    /// [`LEDC_HISTORY_CAPACITY`]
    pub history: VecDeque<u32>,
    /// Duty writes since creation
    pub writes: usize,
}

impl LedcRegisters {
    fn latch(&mut self, duty: u32) {
        self.duty = duty;
        self.writes += 1;
        if self.history.len() == LEDC_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(duty);
    }
}

/// Read-only view on a [`SimulatedLedc`], usable after the channel moved
/// into the driver
#[derive(Debug, Clone)]
pub struct LedcProbe {
    registers: Arc<Mutex<LedcRegisters>>,
}

impl LedcProbe {
    fn read<T>(&self, f: impl FnOnce(&LedcRegisters) -> T) -> T {
        match self.registers.lock() {
            Ok(regs) => f(&regs),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Last latched duty
    pub fn duty(&self) -> u32 {
        self.read(|r| r.duty)
    }

    /// Retained latched duties, oldest first
    pub fn history(&self) -> Vec<u32> {
        self.read(|r| r.history.iter().copied().collect())
    }

    /// Retained duties latched after `mark`, a previous [`updates`](Self::updates) value
    pub fn history_since(&self, mark: usize) -> Vec<u32> {
        self.read(|r| {
            let fresh = r.writes.saturating_sub(mark).min(r.history.len());
            r.history.iter().skip(r.history.len() - fresh).copied().collect()
        })
    }

    /// Number of duty updates, including those no longer retained
    pub fn updates(&self) -> usize {
        self.read(|r| r.writes)
    }

    pub fn config(&self) -> Option<PwmTimerConfig> {
        self.read(|r| r.config)
    }
}

/// Host stand-in for one LEDC timer/channel pair
#[derive(Debug, Clone, Default)]
pub struct SimulatedLedc {
    registers: Arc<Mutex<LedcRegisters>>,
}

impl SimulatedLedc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe sharing this channel's registers
    pub fn probe(&self) -> LedcProbe {
        LedcProbe {
            registers: Arc::clone(&self.registers),
        }
    }

    fn with_registers<T>(
        &self,
        f: impl FnOnce(&mut LedcRegisters) -> Result<T, PwmError>,
    ) -> Result<T, PwmError> {
        let mut regs = self
            .registers
            .lock()
            .map_err(|_| PwmError::WriteFailed("register lock poisoned".into()))?;
        f(&mut regs)
    }
}

/// Checks a timer configuration against the LEDC limits
pub fn validate_timer(config: &PwmTimerConfig) -> Result<(), PwmError> {
    if config.resolution_bits == 0 || config.resolution_bits > LEDC_MAX_RESOLUTION_BITS {
        return Err(PwmError::UnsupportedResolution(config.resolution_bits));
    }

    let needed = config.frequency_hz as u64 * (1u64 << config.resolution_bits);
    if config.frequency_hz == 0 || needed > LEDC_SOURCE_CLOCK_HZ {
        return Err(PwmError::FrequencyOutOfReach {
            frequency_hz: config.frequency_hz,
            resolution_bits: config.resolution_bits,
        });
    }

    Ok(())
}

impl PwmChannel for SimulatedLedc {
    fn configure(&mut self, config: &PwmTimerConfig) -> Result<(), PwmError> {
        validate_timer(config)?;
        self.with_registers(|regs| {
            regs.config = Some(*config);
            regs.duty = 0;
            Ok(())
        })
    }

    fn set_duty(&mut self, duty: u32) -> Result<(), PwmError> {
        self.with_registers(|regs| {
            let config = regs.config.ok_or(PwmError::NotConfigured)?;
            let max = config.max_duty();
            if duty > max {
                return Err(PwmError::DutyOutOfRange { duty, max });
            }
            regs.latch(duty);
            Ok(())
        })
    }

    fn max_duty(&self) -> u32 {
        match self.registers.lock() {
            Ok(regs) => regs.config.map(|c| c.max_duty()).unwrap_or(0),
            Err(_) => 0,
        }
    }
}
