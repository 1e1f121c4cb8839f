use std::time::{
	Duration,
	Instant,
};

use super::{
	Hardware,
	OutPins,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Signal {
	// framing bit: SDI and SII low
	Clear,
	Bits {
		data: bool,
		instruction: bool,
	},
}

impl Signal {
	/// Bit `bit` of both payload bytes.
	pub fn payload(data: u8, instruction: u8, bit: u32) -> Self {
		let bit_mask = 1u8 << bit;
		Signal::Bits {
			data: 0 != (data & bit_mask),
			instruction: 0 != (instruction & bit_mask),
		}
	}

	pub fn with_clock(self, clock: bool) -> OutPins {
		let (data, instruction) = match self {
			Signal::Clear => (false, false),
			Signal::Bits { data, instruction } => (data, instruction),
		};
		OutPins {
			data,
			instruction,
			clock,
		}
	}
}

/// How long to wait for the target to raise SDO after a write strobe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AckPolicy {
	/// Sample until SDO is high, without any upper bound.
	Forever,
	Timeout(Duration),
}

/// Outcome of polling SDO; both variants count the samples taken.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Poll {
	Ready {
		polls: usize,
	},
	TimedOut {
		polls: usize,
	},
}

trait InternalLowLevel: Hardware {
	// prepare SDI/SII during SCI low, then pulse SCI high and low again
	fn pulse(&mut self, signal: Signal) -> crate::AResult<()> {
		self.set_pins(signal.with_clock(false))?;
		self.set_pins(signal.with_clock(true))?;
		self.set_pins(signal.with_clock(false))
	}
}

impl<H: Hardware+?Sized> InternalLowLevel for H {
}

pub trait LowLevel: Hardware {
	/// Clock one (data, instruction) pair into the target.
	///
	/// Each byte is framed as an 11-bit word on the wire: a leading 0 bit,
	/// the payload starting with the highest bit, and two trailing 0 bits.
	/// The target samples SDI/SII on the rising SCI edge.
	fn transfer(&mut self, data: u8, instruction: u8) -> crate::AResult<()> {
		trace!("HVSP transfer: SDI 0x{:02x}, SII 0x{:02x}", data, instruction);

		self.pulse(Signal::Clear)?;
		for bit in (0..8).rev() {
			self.pulse(Signal::payload(data, instruction, bit))?;
		}
		self.pulse(Signal::Clear)?;
		self.pulse(Signal::Clear)
	}

	/// Sample SDO until the target reports ready (high).
	///
	/// A low sample never ends the wait successfully; with
	/// `AckPolicy::Timeout` the wait gives up once the timeout elapsed after
	/// a low sample.
	fn wait_for_ready(&mut self, policy: AckPolicy) -> crate::AResult<Poll> {
		let start = Instant::now();
		let mut polls = 0usize;
		loop {
			polls += 1;
			if self.read_data_out()? {
				return Ok(Poll::Ready { polls });
			}
			if let AckPolicy::Timeout(timeout) = policy {
				if start.elapsed() >= timeout {
					return Ok(Poll::TimedOut { polls });
				}
			}
		}
	}
}

impl<H: Hardware+?Sized> LowLevel for H {
}
