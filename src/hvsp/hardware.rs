use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// State of the three lines driven in lockstep during a transfer: SDI, SII
/// and SCI.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OutPins {
	pub data: bool,
	pub instruction: bool,
	pub clock: bool,
}

impl OutPins {
	pub const CLEAR: OutPins = OutPins {
		data: false,
		instruction: false,
		clock: false,
	};
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Input,
	/// output driven low
	Output,
}

pub trait Hardware {
	/// Drive SDI, SII and SCI.
	///
	/// Implementations that can't update all lines at once must make sure
	/// SDI and SII are stable before a rising SCI edge.
	fn set_pins(&mut self, pins: OutPins) -> crate::AResult<()>;

	/// Logic level of the reset control line.
	///
	/// This is a proxy only: the external 12V switch pulls the target RESET
	/// to ground while the line is high, and applies 12V while it is low.
	fn set_reset(&mut self, high: bool) -> crate::AResult<()>;

	// SDO is held low (as output) while entering programming mode, and then
	// released to receive the target's ready signal.
	fn set_data_out_direction(&mut self, direction: Direction) -> crate::AResult<()>;

	fn read_data_out(&mut self) -> crate::AResult<bool>;

	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}
