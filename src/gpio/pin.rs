use std::fs;
use std::io::Write;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::time::Duration;

use crate::hvsp::{
	Direction,
	reliable_sleep,
};

const GPIO_ROOT: &str = "/sys/class/gpio";

// udev may need a moment to fix permissions on freshly exported pins
const EXPORT_RETRIES: usize = 20;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(10);

fn gpio_file(number: u32, name: &str) -> String {
	format!("{}/gpio{}/{}", GPIO_ROOT, number, name)
}

fn write_control(name: &str, number: u32) -> crate::AResult<()> {
	// need to write in one syscall for export/unexport
	let path = format!("{}/{}", GPIO_ROOT, name);
	fs::OpenOptions::new().write(true).open(path)?.write_all(number.to_string().as_bytes())?;
	Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mode {
	Input,
	OutputLow,
	OutputHigh,
}

impl From<Direction> for Mode {
	fn from(direction: Direction) -> Self {
		match direction {
			Direction::Input => Mode::Input,
			Direction::Output => Mode::OutputLow,
		}
	}
}

// "low"/"high" switch to output with the given initial level without glitching
pub(super) fn mode_value(mode: Mode) -> &'static [u8] {
	match mode {
		Mode::Input => b"in",
		Mode::OutputLow => b"low",
		Mode::OutputHigh => b"high",
	}
}

pub(super) fn parse_value(buf: &[u8]) -> crate::AResult<bool> {
	match buf.first() {
		Some(b'0') => Ok(false),
		Some(b'1') => Ok(true),
		_ => bail!("Invalid GPIO value {:?}", String::from_utf8_lossy(buf)),
	}
}

/// A sysfs GPIO line, exported for as long as the `Pin` lives (unless it
/// was already exported before).
#[derive(Debug)]
pub struct Pin {
	number: u32,
	value: fs::File,
	unexport: bool,
}

impl Pin {
	pub fn open(number: u32, mode: Mode) -> crate::AResult<Pin> {
		let unexport = if Path::new(&gpio_file(number, "value")).exists() {
			false
		} else {
			with_context!(("GPIO {}: export", number), write_control("export", number))?;
			true
		};

		let mut tries = 0;
		let value = loop {
			let res = fs::OpenOptions::new()
				.read(true)
				.write(true)
				.open(gpio_file(number, "value"));
			match res {
				Ok(file) => break file,
				Err(e) => {
					tries += 1;
					if tries >= EXPORT_RETRIES {
						if unexport {
							let _ = write_control("unexport", number);
						}
						bail!("GPIO {}: couldn't open value file: {}", number, e);
					}
					reliable_sleep(EXPORT_RETRY_DELAY);
				},
			}
		};

		let mut pin = Pin {
			number,
			value,
			unexport,
		};
		pin.set_mode(mode)?;
		Ok(pin)
	}

	pub fn number(&self) -> u32 {
		self.number
	}

	pub fn set_mode(&mut self, mode: Mode) -> crate::AResult<()> {
		let number = self.number;
		with_context!(("GPIO {}: set direction {:?}", number, mode), {
			fs::OpenOptions::new()
				.write(true)
				.open(gpio_file(number, "direction"))?
				.write_all(mode_value(mode))?;
			Ok(())
		})
	}

	pub fn write(&mut self, high: bool) -> crate::AResult<()> {
		let buf: &[u8] = if high { b"1" } else { b"0" };
		let l = with_context!(("GPIO {}: write value", self.number), Ok(self.value.write_at(buf, 0)?))?;
		ensure!(l == buf.len(), "GPIO {}: failed to write value", self.number);
		Ok(())
	}

	pub fn read(&mut self) -> crate::AResult<bool> {
		let mut buf = [0u8; 2];
		let l = with_context!(("GPIO {}: read value", self.number), Ok(self.value.read_at(&mut buf, 0)?))?;
		parse_value(&buf[..l])
	}
}

impl Drop for Pin {
	fn drop(&mut self) {
		if self.unexport {
			if let Err(e) = write_control("unexport", self.number) {
				error!("GPIO {}: Failed to unexport temporarily exported pin: {}", self.number, e);
			}
		}
	}
}
