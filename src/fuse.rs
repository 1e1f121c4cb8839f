//! ATtiny25/45/85 fuse bytes
//!
//! Fuse bits are active low: a bit reading 0 is "programmed".

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum FuseKind {
	Low,
	High,
	Extended,
}

impl FuseKind {
	/// Programming order
	pub const ALL: [FuseKind; 3] = [FuseKind::Low, FuseKind::High, FuseKind::Extended];

	pub fn index(self) -> usize {
		match self {
			FuseKind::Low => 0,
			FuseKind::High => 1,
			FuseKind::Extended => 2,
		}
	}
}

impl fmt::Display for FuseKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			FuseKind::Low => write!(f, "low"),
			FuseKind::High => write!(f, "high"),
			FuseKind::Extended => write!(f, "extended"),
		}
	}
}

fn programmed(value: u8, bit: u8) -> bool {
	0 == value & (1 << bit)
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ClockSource {
	External,
	HighFrequencyPll,
	Internal8MHz,
	Internal6_4MHz, // ATtiny15 compatibility mode
	Internal128kHz,
	LowFrequencyCrystal,
	Crystal,
	Reserved,
}

impl ClockSource {
	fn from_cksel(cksel: u8) -> Self {
		match cksel & 0xf {
			0b0000 => ClockSource::External,
			0b0001 => ClockSource::HighFrequencyPll,
			0b0010 => ClockSource::Internal8MHz,
			0b0011 => ClockSource::Internal6_4MHz,
			0b0100 => ClockSource::Internal128kHz,
			0b0110 => ClockSource::LowFrequencyCrystal,
			0b1000..=0b1111 => ClockSource::Crystal,
			_ => ClockSource::Reserved,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BrownOutLevel {
	Disabled,
	Volt1_8,
	Volt2_7,
	Volt4_3,
	Reserved,
}

impl BrownOutLevel {
	fn from_bodlevel(bodlevel: u8) -> Self {
		match bodlevel & 0x7 {
			0b111 => BrownOutLevel::Disabled,
			0b110 => BrownOutLevel::Volt1_8,
			0b101 => BrownOutLevel::Volt2_7,
			0b100 => BrownOutLevel::Volt4_3,
			_ => BrownOutLevel::Reserved,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LowFuse(pub u8);

impl LowFuse {
	pub fn clock_divided_by_8(&self) -> bool {
		programmed(self.0, 7)
	}
	pub fn clock_output(&self) -> bool {
		programmed(self.0, 6)
	}
	// SUT[1:0], raw
	pub fn startup_time(&self) -> u8 {
		(self.0 >> 4) & 0x3
	}
	pub fn clock_source(&self) -> ClockSource {
		ClockSource::from_cksel(self.0)
	}
}

impl fmt::Debug for LowFuse {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (clock: {:?}, SUT: 0b{:02b}", self.0, self.clock_source(), self.startup_time())?;
		if self.clock_divided_by_8() { write!(f, " [CKDIV8]")?; }
		if self.clock_output() { write!(f, " [CKOUT]")?; }
		write!(f, ")")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HighFuse(pub u8);

impl HighFuse {
	pub fn reset_disabled(&self) -> bool {
		programmed(self.0, 7)
	}
	pub fn debugwire_enabled(&self) -> bool {
		programmed(self.0, 6)
	}
	pub fn spi_programming_enabled(&self) -> bool {
		programmed(self.0, 5)
	}
	pub fn watchdog_always_on(&self) -> bool {
		programmed(self.0, 4)
	}
	pub fn eeprom_preserved(&self) -> bool {
		programmed(self.0, 3)
	}
	pub fn brown_out_level(&self) -> BrownOutLevel {
		BrownOutLevel::from_bodlevel(self.0)
	}
}

impl fmt::Debug for HighFuse {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (brown-out: {:?}", self.0, self.brown_out_level())?;
		if self.reset_disabled() { write!(f, " [RSTDISBL]")?; }
		if self.debugwire_enabled() { write!(f, " [DWEN]")?; }
		if self.spi_programming_enabled() { write!(f, " [SPIEN]")?; }
		if self.watchdog_always_on() { write!(f, " [WDTON]")?; }
		if self.eeprom_preserved() { write!(f, " [EESAVE]")?; }
		write!(f, ")")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtendedFuse(pub u8);

impl ExtendedFuse {
	pub fn self_programming_enabled(&self) -> bool {
		programmed(self.0, 0)
	}
}

impl fmt::Debug for ExtendedFuse {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.self_programming_enabled() { write!(f, "[SELFPRGEN]")?; }
		write!(f, ")")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FuseBits {
	Low(LowFuse),
	High(HighFuse),
	Extended(ExtendedFuse),
}

impl FuseBits {
	pub fn kind(&self) -> FuseKind {
		match self {
			FuseBits::Low(_) => FuseKind::Low,
			FuseBits::High(_) => FuseKind::High,
			FuseBits::Extended(_) => FuseKind::Extended,
		}
	}

	/// Settings that lock out the usual (low voltage) ways to talk to the
	/// chip; only HVSP can undo them.
	pub fn warnings(&self) -> Vec<&'static str> {
		let mut warnings = Vec::new();
		if let FuseBits::High(high) = self {
			if high.reset_disabled() {
				warnings.push("RSTDISBL programmed: RESET pin becomes I/O, ISP won't work anymore");
			}
			if !high.spi_programming_enabled() {
				warnings.push("SPIEN unprogrammed: serial (ISP) programming disabled");
			}
			if high.debugwire_enabled() {
				warnings.push("DWEN programmed: debugWIRE takes over the RESET pin");
			}
		}
		if let FuseBits::Low(low) = self {
			if low.clock_source() == ClockSource::Reserved {
				warnings.push("reserved CKSEL value");
			}
		}
		warnings
	}
}

impl fmt::Display for FuseBits {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			FuseBits::Low(v) => write!(f, "low fuse {:?}", v),
			FuseBits::High(v) => write!(f, "high fuse {:?}", v),
			FuseBits::Extended(v) => write!(f, "extended fuse {:?}", v),
		}
	}
}

pub fn describe(kind: FuseKind, value: u8) -> FuseBits {
	match kind {
		FuseKind::Low => FuseBits::Low(LowFuse(value)),
		FuseKind::High => FuseBits::High(HighFuse(value)),
		FuseKind::Extended => FuseBits::Extended(ExtendedFuse(value)),
	}
}
