//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Synthetic machine emitting status records for hardware-free runs."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use rand::prelude::*;

use crate::status::{MachineMode, MachineStatus, STEAM_TAG};

/// Interval between records on the real machine's UART, roughly.
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_millis(400);

const FAST_HEAT_START: u16 = 1500;
const FAST_HEAT_STEP: u16 = 4;
const AMBIENT_TEMP: u16 = 20;

/// Render a status as the device would put it on the wire, `\r\n` included.
pub fn encode_record(status: &MachineStatus) -> String {
    let tag = match status.mode {
        MachineMode::Steam => STEAM_TAG,
        MachineMode::Coffee => 'C',
    };
    format!(
        "{}{},{:03},{:03},{:03},{:04},{}\r\n",
        tag,
        status.version,
        status.steam_temp,
        status.steam_target_temp,
        status.hx_temp,
        status.ready_countdown,
        u8::from(status.heating)
    )
}

/// A machine heating up from cold, readable like its serial port.
///
/// Each read that finds the previous record consumed sleeps for the emit
/// interval and then produces the next record. The thermostat is a plain
/// bang-bang loop around the target with a little noise on every reading.
#[derive(Debug)]
pub struct SimulatedMachine {
    status: MachineStatus,
    interval: Duration,
    rng: StdRng,
    pending: Vec<u8>,
}

impl SimulatedMachine {
    pub fn new(mode: MachineMode, interval: Duration, seed: u64) -> Self {
        let steam_target_temp = match mode {
            MachineMode::Coffee => 120,
            MachineMode::Steam => 140,
        };
        Self {
            status: MachineStatus {
                version: "1.06".to_owned(),
                mode,
                steam_temp: AMBIENT_TEMP,
                steam_target_temp,
                hx_temp: AMBIENT_TEMP,
                ready_countdown: FAST_HEAT_START,
                heating: true,
            },
            interval,
            rng: StdRng::seed_from_u64(seed),
            pending: Vec::new(),
        }
    }

    /// Advance the model by one record and return it.
    pub fn next_status(&mut self) -> MachineStatus {
        let status = &mut self.status;
        status.ready_countdown = status.ready_countdown.saturating_sub(FAST_HEAT_STEP);
        status.heating = status.steam_temp < status.steam_target_temp;

        let jitter: i16 = self.rng.gen_range(-1..=1);
        if status.heating {
            status.steam_temp = status.steam_temp.saturating_add(2);
        } else {
            status.steam_temp = status.steam_temp.saturating_sub(1);
        }
        status.steam_temp = status.steam_temp.saturating_add_signed(jitter);

        let hx_target = status.steam_temp.saturating_sub(25).max(AMBIENT_TEMP);
        if status.hx_temp < hx_target {
            status.hx_temp += 1;
        } else if status.hx_temp > hx_target {
            status.hx_temp -= 1;
        }

        status.clone()
    }
}

impl Read for SimulatedMachine {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            thread::sleep(self.interval);
            let status = self.next_status();
            self.pending = encode_record(&status).into_bytes();
        }
        let count = buf.len().min(self.pending.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(count)
    }
}
