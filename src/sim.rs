//! Simulated HVSP target
//!
//! Records every line change, decodes the clocked frames and models just
//! enough of an ATtiny85 in high-voltage programming mode to accept fuse
//! writes and signal completion on SDO.

use std::time::Duration;

use crate::fuse::FuseKind;
use crate::hvsp::{
	Direction,
	FuseWrite,
	Hardware,
	LOAD_COMMAND,
	LOAD_DATA_LOW_BYTE,
	OutPins,
	WRITE_FUSE_COMMAND,
};

// start bit, 8 payload bits, 2 stop bits
const FRAME_BITS: u32 = 11;
const FRAMING_MASK: u16 = 0b100_0000_0011;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
	Pins(OutPins),
	Reset(bool),
	DataOutDirection(Direction),
	ReadDataOut(bool),
	Delay(Duration),
}

/// Protocol level view of the line events
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Activity {
	Transfer {
		data: u8,
		instruction: u8,
	},
	Poll(bool),
}

pub struct SimulatedTarget {
	events: Vec<Event>,
	activity: Vec<Activity>,
	transfers: Vec<(u8, u8)>,

	pins: OutPins,
	reset: bool,
	data_out: Direction,
	high_voltage: bool,

	frame_len: u32,
	shift_data: u16,
	shift_instruction: u16,

	command: Option<u8>,
	data_latch: u8,
	selected: Option<FuseKind>,
	fuses: [Option<u8>; 3],
	committed: Vec<FuseKind>,

	busy_polls: usize,
	busy: usize,
	never_ready: bool,
}

impl SimulatedTarget {
	pub fn new() -> Self {
		SimulatedTarget {
			events: Vec::new(),
			activity: Vec::new(),
			transfers: Vec::new(),
			pins: OutPins::CLEAR,
			reset: false,
			data_out: Direction::Input,
			high_voltage: false,
			frame_len: 0,
			shift_data: 0,
			shift_instruction: 0,
			command: None,
			data_latch: 0xff,
			selected: None,
			fuses: [None; 3],
			committed: Vec::new(),
			busy_polls: 0,
			busy: 0,
			never_ready: false,
		}
	}

	/// A target that already is in high-voltage programming mode.
	pub fn programming() -> Self {
		let mut target = Self::new();
		target.high_voltage = true;
		target
	}

	/// Number of low SDO samples after each write strobe.
	pub fn with_busy_polls(mut self, polls: usize) -> Self {
		self.busy_polls = polls;
		self
	}

	/// SDO never goes high.
	pub fn never_acknowledge(mut self) -> Self {
		self.never_ready = true;
		self
	}

	/// Behave as if a write was just strobed.
	pub fn start_busy(&mut self) {
		self.busy = self.busy_polls;
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	pub fn activity(&self) -> &[Activity] {
		&self.activity
	}

	/// Decoded (SDI, SII) frames, in or out of programming mode
	pub fn transfers(&self) -> &[(u8, u8)] {
		&self.transfers
	}

	/// Fuses written in programming mode, in order
	pub fn committed(&self) -> &[FuseKind] {
		&self.committed
	}

	pub fn fuse(&self, kind: FuseKind) -> Option<u8> {
		self.fuses[kind.index()]
	}

	pub fn in_programming_mode(&self) -> bool {
		self.high_voltage
	}

	fn clock_in(&mut self, data: bool, instruction: bool) {
		self.shift_data = (self.shift_data << 1) | (data as u16);
		self.shift_instruction = (self.shift_instruction << 1) | (instruction as u16);
		self.frame_len += 1;
		if self.frame_len < FRAME_BITS {
			return;
		}
		self.frame_len = 0;

		let sdi = self.shift_data & 0x7ff;
		let sii = self.shift_instruction & 0x7ff;
		if 0 != (sdi | sii) & FRAMING_MASK {
			warn!("Simulated target: framing error (SDI 0b{:011b}, SII 0b{:011b})", sdi, sii);
			return;
		}
		self.frame((sdi >> 2) as u8, (sii >> 2) as u8);
	}

	fn frame(&mut self, data: u8, instruction: u8) {
		trace!("Simulated target: SDI 0x{:02x}, SII 0x{:02x}", data, instruction);
		self.transfers.push((data, instruction));
		self.activity.push(Activity::Transfer { data, instruction });
		if self.high_voltage {
			self.execute(data, instruction);
		}
	}

	fn execute(&mut self, data: u8, instruction: u8) {
		match instruction {
			LOAD_COMMAND => {
				self.command = Some(data);
				self.selected = None;
			},
			LOAD_DATA_LOW_BYTE => {
				self.data_latch = data;
			},
			_ if self.command == Some(WRITE_FUSE_COMMAND) => {
				for &kind in FuseKind::ALL.iter() {
					let write = FuseWrite::new(kind, self.data_latch);
					if instruction == write.select_instruction() {
						self.selected = Some(kind);
					} else if instruction == write.strobe_instruction() && self.selected == Some(kind) {
						self.fuses[kind.index()] = Some(write.value);
						self.committed.push(kind);
						self.selected = None;
						self.busy = self.busy_polls;
					}
				}
			},
			_ => {
				debug!("Simulated target: ignoring instruction 0x{:02x}", instruction);
			},
		}
	}
}

impl Default for SimulatedTarget {
	fn default() -> Self {
		Self::new()
	}
}

impl Hardware for SimulatedTarget {
	fn set_pins(&mut self, pins: OutPins) -> crate::AResult<()> {
		self.events.push(Event::Pins(pins));
		if pins.clock && !self.pins.clock {
			self.clock_in(pins.data, pins.instruction);
		}
		self.pins = pins;
		Ok(())
	}

	fn set_reset(&mut self, high: bool) -> crate::AResult<()> {
		self.events.push(Event::Reset(high));
		if high {
			self.high_voltage = false;
		} else if self.reset && !self.pins.data && !self.pins.instruction && self.data_out == Direction::Output {
			// Prog_enable pattern latched while 12V is applied
			self.high_voltage = true;
			self.frame_len = 0;
			self.command = None;
			self.selected = None;
		}
		self.reset = high;
		Ok(())
	}

	fn set_data_out_direction(&mut self, direction: Direction) -> crate::AResult<()> {
		self.events.push(Event::DataOutDirection(direction));
		self.data_out = direction;
		Ok(())
	}

	fn read_data_out(&mut self) -> crate::AResult<bool> {
		let value = match self.data_out {
			// still driven low by the programmer
			Direction::Output => false,
			Direction::Input => if self.never_ready {
				false
			} else if self.busy > 0 {
				self.busy -= 1;
				false
			} else {
				true
			},
		};
		self.events.push(Event::ReadDataOut(value));
		self.activity.push(Activity::Poll(value));
		Ok(value)
	}

	fn delay(&mut self, duration: Duration) {
		self.events.push(Event::Delay(duration));
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::hvsp::{
		AckPolicy,
		FuseOperations,
		LowLevel,
	};

	#[test]
	fn writes_outside_programming_mode_are_ignored() {
		let mut target = SimulatedTarget::new();
		target.write_fuse(FuseWrite::new(FuseKind::Low, 0x00), AckPolicy::Forever).unwrap();
		assert_eq!(target.transfers().len(), 4);
		assert!(target.committed().is_empty());
		assert_eq!(target.fuse(FuseKind::Low), None);
	}

	#[test]
	fn strobe_needs_matching_select() {
		let mut target = SimulatedTarget::programming();
		target.transfer(WRITE_FUSE_COMMAND, LOAD_COMMAND).unwrap();
		target.transfer(0x12, LOAD_DATA_LOW_BYTE).unwrap();
		// high fuse selected, low fuse strobe
		target.transfer(0x00, FuseWrite::new(FuseKind::High, 0).select_instruction()).unwrap();
		target.transfer(0x00, FuseWrite::new(FuseKind::Low, 0).strobe_instruction()).unwrap();
		assert!(target.committed().is_empty());

		target.transfer(0x00, FuseWrite::new(FuseKind::High, 0).strobe_instruction()).unwrap();
		assert_eq!(target.committed(), &[FuseKind::High][..]);
		assert_eq!(target.fuse(FuseKind::High), Some(0x12));
	}

	#[test]
	fn entry_needs_low_data_lines() {
		let mut target = SimulatedTarget::new();
		target.set_data_out_direction(Direction::Output).unwrap();
		target.set_pins(OutPins { data: true, instruction: false, clock: false }).unwrap();
		target.set_reset(true).unwrap();
		target.set_reset(false).unwrap();
		assert!(!target.in_programming_mode());

		target.set_pins(OutPins::CLEAR).unwrap();
		target.set_reset(true).unwrap();
		target.set_reset(false).unwrap();
		assert!(target.in_programming_mode());

		target.set_reset(true).unwrap();
		assert!(!target.in_programming_mode());
	}

	#[test]
	fn framing_errors_are_dropped() {
		let mut target = SimulatedTarget::new();
		// start bit set
		for &data in [true, false, false, false, false, false, false, false, false, false, false].iter() {
			target.set_pins(OutPins { data, instruction: false, clock: false }).unwrap();
			target.set_pins(OutPins { data, instruction: false, clock: true }).unwrap();
		}
		assert!(target.transfers().is_empty());
	}
}
