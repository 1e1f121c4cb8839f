//! Build-time programmer configuration

use std::time::Duration;

use crate::fuse::FuseKind;
use crate::hvsp::{
	AckPolicy,
	FuseWrite,
};

/// GPIO numbers the HVSP lines are wired to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PinAssignment {
	pub data_in: u32,        // SDI
	pub instruction_in: u32, // SII
	pub data_out: u32,       // SDO
	pub clock: u32,          // SCI
	pub reset: u32,          // 12V switch
}

impl PinAssignment {
	pub const DEFAULT: PinAssignment = PinAssignment {
		data_in: 9,
		instruction_in: 10,
		data_out: 11,
		clock: 12,
		reset: 13,
	};
}

/// Fuse bytes to program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FuseValues {
	pub low: u8,
	pub high: u8,
	pub extended: u8,
}

impl FuseValues {
	/// ATtiny85 factory defaults: internal 8 MHz oscillator divided by 8,
	/// SPI programming enabled, no brown-out detection.
	pub const DEFAULT: FuseValues = FuseValues {
		low: 0x62,
		high: 0xdf,
		extended: 0xff,
	};

	pub fn get(&self, kind: FuseKind) -> u8 {
		match kind {
			FuseKind::Low => self.low,
			FuseKind::High => self.high,
			FuseKind::Extended => self.extended,
		}
	}

	/// All writes in programming order
	pub fn writes(&self) -> [FuseWrite; 3] {
		let mut writes = [FuseWrite::new(FuseKind::Low, 0); 3];
		for (write, &kind) in writes.iter_mut().zip(FuseKind::ALL.iter()) {
			*write = FuseWrite::new(kind, self.get(kind));
		}
		writes
	}
}

/// Delays of the entry sequence
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntryTiming {
	// RESET pulled to ground before applying 12V
	pub reset_pulse: Duration,
	// 12V applied, SDO still held low
	pub high_voltage_settle: Duration,
	// SDO released, before the first instruction
	pub data_out_settle: Duration,
}

impl EntryTiming {
	pub const DEFAULT: EntryTiming = EntryTiming {
		reset_pulse: Duration::from_micros(20),
		high_voltage_settle: Duration::from_micros(10),
		data_out_settle: Duration::from_micros(300),
	};
}

pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProgrammerConfig {
	pub pins: PinAssignment,
	pub fuses: FuseValues,
	pub timing: EntryTiming,
	pub ack: AckPolicy,
}

impl ProgrammerConfig {
	pub const DEFAULT: ProgrammerConfig = ProgrammerConfig {
		pins: PinAssignment::DEFAULT,
		fuses: FuseValues::DEFAULT,
		timing: EntryTiming::DEFAULT,
		ack: AckPolicy::Timeout(DEFAULT_ACK_TIMEOUT),
	};
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn default_writes_in_order() {
		let writes = FuseValues::DEFAULT.writes();
		assert_eq!(writes, [
			FuseWrite::new(FuseKind::Low, 0x62),
			FuseWrite::new(FuseKind::High, 0xdf),
			FuseWrite::new(FuseKind::Extended, 0xff),
		]);
	}

	#[test]
	fn default_pins_are_distinct() {
		let p = PinAssignment::DEFAULT;
		let mut all = vec![p.data_in, p.instruction_in, p.data_out, p.clock, p.reset];
		all.sort();
		all.dedup();
		assert_eq!(all.len(), 5);
	}
}
