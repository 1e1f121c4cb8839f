use std::time::Duration;

use failure::Fail;

use crate::fuse::FuseKind;

use super::{
	AckPolicy,
	Hardware,
	LowLevel,
	Poll,
};

// SDI / SII payloads from the "Write Fuse Low/High/Extended Bits" tables
mod consts {
	// instruction 1: load command "Write Fuse bits"
	pub const WRITE_FUSE_COMMAND: u8 = 0b0100_0000;
	pub const LOAD_COMMAND: u8 = 0b0100_1100;

	// instruction 2: load data low byte
	pub const LOAD_DATA_LOW_BYTE: u8 = 0b0010_1100;

	// instruction 3: select fuse byte, instruction 4: write strobe
	pub const LOW_FUSE_SELECT: u8 = 0b0110_0100;
	pub const LOW_FUSE_STROBE: u8 = 0b0110_1100;
	pub const HIGH_FUSE_SELECT: u8 = 0b0111_0100;
	pub const HIGH_FUSE_STROBE: u8 = 0b0111_1100;
	pub const EXTENDED_FUSE_SELECT: u8 = 0b0110_0110;
	pub const EXTENDED_FUSE_STROBE: u8 = 0b0110_1110;
}

pub use self::consts::{
	LOAD_COMMAND,
	LOAD_DATA_LOW_BYTE,
	WRITE_FUSE_COMMAND,
};

use self::consts::*;

/// One fuse byte to write, and the instruction frames needed for it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FuseWrite {
	pub kind: FuseKind,
	pub value: u8,
}

impl FuseWrite {
	pub fn new(kind: FuseKind, value: u8) -> Self {
		FuseWrite { kind, value }
	}

	pub fn select_instruction(&self) -> u8 {
		match self.kind {
			FuseKind::Low => LOW_FUSE_SELECT,
			FuseKind::High => HIGH_FUSE_SELECT,
			FuseKind::Extended => EXTENDED_FUSE_SELECT,
		}
	}

	pub fn strobe_instruction(&self) -> u8 {
		match self.kind {
			FuseKind::Low => LOW_FUSE_STROBE,
			FuseKind::High => HIGH_FUSE_STROBE,
			FuseKind::Extended => EXTENDED_FUSE_STROBE,
		}
	}

	/// (SDI, SII) pairs in transmission order
	pub fn frames(&self) -> [(u8, u8); 4] {
		[
			(WRITE_FUSE_COMMAND, LOAD_COMMAND),
			(self.value, LOAD_DATA_LOW_BYTE),
			(0x00, self.select_instruction()),
			(0x00, self.strobe_instruction()),
		]
	}
}

/// The target didn't raise SDO after a fuse write strobe in time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Fail)]
#[fail(display = "{} fuse write not acknowledged within {:?} ({} polls)", fuse, timeout, polls)]
pub struct AckTimeout {
	pub fuse: FuseKind,
	pub timeout: Duration,
	pub polls: usize,
}

pub trait FuseOperations: LowLevel {
	/// Send the four instruction frames writing `fuse`, then wait for the
	/// target to acknowledge the write.
	///
	/// Returns the number of SDO samples it took until the target was ready.
	fn write_fuse(&mut self, fuse: FuseWrite, policy: AckPolicy) -> crate::AResult<usize> {
		debug!("Writing {} fuse: 0x{:02x}", fuse.kind, fuse.value);
		for &(data, instruction) in fuse.frames().iter() {
			self.transfer(data, instruction)?;
		}

		match self.wait_for_ready(policy)? {
			Poll::Ready { polls } => {
				debug!("{} fuse write acknowledged after {} polls", fuse.kind, polls);
				Ok(polls)
			},
			Poll::TimedOut { polls } => {
				let timeout = match policy {
					AckPolicy::Timeout(timeout) => timeout,
					AckPolicy::Forever => unreachable!(),
				};
				Err(AckTimeout {
					fuse: fuse.kind,
					timeout,
					polls,
				}.into())
			},
		}
	}
}

impl<H: Hardware+?Sized> FuseOperations for H {
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::*;
	use crate::sim::{
		Activity,
		SimulatedTarget,
	};

	fn check_fuse_write(kind: FuseKind, value: u8, expected: [(u8, u8); 4]) {
		let mut target = SimulatedTarget::programming().with_busy_polls(2);
		let polls = target.write_fuse(FuseWrite::new(kind, value), AckPolicy::Forever).unwrap();
		assert_eq!(polls, 3);
		assert_eq!(target.fuse(kind), Some(value));
		assert_eq!(target.committed(), &[kind][..]);

		assert_eq!(target.transfers(), &expected[..], "{} fuse frames", kind);

		// exactly four transfers, then only SDO samples
		let activity = target.activity();
		assert_eq!(activity.len(), 7);
		for (a, &(data, instruction)) in activity[..4].iter().zip(expected.iter()) {
			assert_eq!(*a, Activity::Transfer { data, instruction });
		}
		assert_eq!(&activity[4..], &[Activity::Poll(false), Activity::Poll(false), Activity::Poll(true)][..]);
	}

	#[test]
	fn write_low_fuse() {
		check_fuse_write(FuseKind::Low, 0x62, [(0x40, 0x4c), (0x62, 0x2c), (0x00, 0x64), (0x00, 0x6c)]);
	}

	#[test]
	fn write_high_fuse() {
		check_fuse_write(FuseKind::High, 0xdf, [(0x40, 0x4c), (0xdf, 0x2c), (0x00, 0x74), (0x00, 0x7c)]);
	}

	#[test]
	fn write_extended_fuse() {
		check_fuse_write(FuseKind::Extended, 0xff, [(0x40, 0x4c), (0xff, 0x2c), (0x00, 0x66), (0x00, 0x6e)]);
	}

	#[test]
	fn fuse_value_only_in_load_data_frame() {
		for &kind in FuseKind::ALL.iter() {
			let a = FuseWrite::new(kind, 0x00).frames();
			let b = FuseWrite::new(kind, 0xa5).frames();
			assert_eq!(a[0], b[0]);
			assert_eq!(a[2], b[2]);
			assert_eq!(a[3], b[3]);
			assert_eq!(b[1], (0xa5, LOAD_DATA_LOW_BYTE));
		}
	}

	#[test]
	fn missing_ack_is_a_timeout_error() {
		let mut target = SimulatedTarget::programming().never_acknowledge();
		let timeout = Duration::from_millis(5);
		let err = target.write_fuse(FuseWrite::new(FuseKind::High, 0xdf), AckPolicy::Timeout(timeout)).unwrap_err();
		let ack = err.downcast_ref::<AckTimeout>().expect("AckTimeout error");
		assert_eq!(ack.fuse, FuseKind::High);
		assert_eq!(ack.timeout, timeout);
		assert!(ack.polls >= 1);
		// all four frames were sent before giving up
		assert_eq!(target.transfers().len(), 4);
	}
}
