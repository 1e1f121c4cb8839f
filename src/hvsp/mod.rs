//! High-voltage serial programming (HVSP) for ATtiny25/45/85 fuses
//!
//! The target is held in reset with 12V on its RESET pin, and talks over
//! four lines:
//! - SDI: serial data input (to the target)
//! - SII: serial instruction input (to the target)
//! - SCI: serial clock input, target samples SDI/SII on the rising edge
//! - SDO: serial data output (from the target), high when ready
//!
//! Every instruction is a pair of 11-bit words on SDI and SII, clocked in
//! lockstep: a 0 start bit, 8 payload bits (highest first), and two 0 stop
//! bits:
//!
//! ```text
//!       Instr.1          Instr.2          Instr.3          Instr.4
//! SDI   0_0100_0000_00   0_FUSE_BYTE_00   0_0000_0000_00   0_0000_0000_00
//! SII   0_0100_1100_00   0_0010_1100_00   0_0110_0100_00   0_0110_1100_00   (low)
//!                                         0_0111_0100_00   0_0111_1100_00   (high)
//!                                         0_0110_0110_00   0_0110_1110_00   (extended)
//! ```
//!
//! After instruction 4 the programmer waits until SDO goes high.

mod hardware;
mod low_level;
mod operations;
mod session;

pub use self::hardware::{
	Direction,
	Hardware,
	OutPins,
	reliable_sleep,
};

pub use self::low_level::{
	AckPolicy,
	LowLevel,
	Poll,
	Signal,
};

pub use self::operations::{
	AckTimeout,
	FuseOperations,
	FuseWrite,
	LOAD_COMMAND,
	LOAD_DATA_LOW_BYTE,
	WRITE_FUSE_COMMAND,
};

pub use self::session::{
	Session,
	State,
	program,
};
