//! HVSP lines on Linux sysfs GPIOs (`/sys/class/gpio`)

mod pin;

pub use self::pin::{
	Mode,
	Pin,
};

use crate::config::PinAssignment;
use crate::hvsp::{
	Direction,
	Hardware,
	OutPins,
};

pub struct SysfsGpio {
	data_in: Pin,
	instruction_in: Pin,
	data_out: Pin,
	clock: Pin,
	reset: Pin,
	data_out_direction: Direction,
	current: OutPins,
}

impl SysfsGpio {
	/// Export (if necessary) and configure all lines.
	///
	/// SDI, SII, SDO and SCI start as outputs driven low. RESET starts high,
	/// i.e. the target is held in reset without 12V applied.
	pub fn open(pins: &PinAssignment) -> crate::AResult<Self> {
		info!(
			"Opening GPIOs: SDI {}, SII {}, SDO {}, SCI {}, RESET {}",
			pins.data_in, pins.instruction_in, pins.data_out, pins.clock, pins.reset,
		);
		Ok(SysfsGpio {
			reset: Pin::open(pins.reset, Mode::OutputHigh)?,
			data_in: Pin::open(pins.data_in, Mode::OutputLow)?,
			instruction_in: Pin::open(pins.instruction_in, Mode::OutputLow)?,
			data_out: Pin::open(pins.data_out, Mode::OutputLow)?,
			clock: Pin::open(pins.clock, Mode::OutputLow)?,
			data_out_direction: Direction::Output,
			current: OutPins::CLEAR,
		})
	}

	fn write_data_lines(&mut self, pins: OutPins) -> crate::AResult<()> {
		if pins.data != self.current.data {
			self.data_in.write(pins.data)?;
		}
		if pins.instruction != self.current.instruction {
			self.instruction_in.write(pins.instruction)?;
		}
		Ok(())
	}
}

impl Hardware for SysfsGpio {
	fn set_pins(&mut self, pins: OutPins) -> crate::AResult<()> {
		// lines are written one by one: change SDI/SII only while SCI is low
		if pins.clock {
			self.write_data_lines(pins)?;
			if !self.current.clock {
				self.clock.write(true)?;
			}
		} else {
			if self.current.clock {
				self.clock.write(false)?;
			}
			self.write_data_lines(pins)?;
		}
		self.current = pins;
		Ok(())
	}

	fn set_reset(&mut self, high: bool) -> crate::AResult<()> {
		self.reset.write(high)
	}

	fn set_data_out_direction(&mut self, direction: Direction) -> crate::AResult<()> {
		if direction != self.data_out_direction {
			self.data_out.set_mode(direction.into())?;
			self.data_out_direction = direction;
		}
		Ok(())
	}

	fn read_data_out(&mut self) -> crate::AResult<bool> {
		self.data_out.read()
	}
}
