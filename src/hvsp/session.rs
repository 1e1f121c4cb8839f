use std::fmt;

use crate::config::{
	EntryTiming,
	FuseValues,
	ProgrammerConfig,
};

use super::{
	AckPolicy,
	Direction,
	FuseOperations,
	FuseWrite,
	Hardware,
	OutPins,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum State {
	Idle,
	Programming,
	Done,
}

impl fmt::Display for State {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			State::Idle => write!(f, "idle"),
			State::Programming => write!(f, "programming"),
			State::Done => write!(f, "done"),
		}
	}
}

/// High-voltage programming session on a target.
///
/// Fuses can only be written between `enter` and `exit`; once exited the
/// session can't be entered again. Dropping a session that is still
/// programming (e.g. because a write wasn't acknowledged) removes the high
/// voltage.
pub struct Session<'a, H: Hardware+?Sized+'a> {
	hardware: &'a mut H,
	ack: AckPolicy,
	state: State,
}

impl<'a, H: Hardware+?Sized> Session<'a, H> {
	pub fn new(hardware: &'a mut H, ack: AckPolicy) -> Self {
		Session {
			hardware,
			ack,
			state: State::Idle,
		}
	}

	pub fn state(&self) -> State {
		self.state
	}

	pub fn enter(&mut self, timing: &EntryTiming) -> crate::AResult<()> {
		ensure!(self.state == State::Idle, "Can't enter programming mode: session is {}", self.state);
		info!("Entering high-voltage programming mode");

		// SDI, SII and SDO must be low while high voltage is applied
		self.hardware.set_data_out_direction(Direction::Output)?;
		self.hardware.set_pins(OutPins::CLEAR)?;

		self.hardware.set_reset(true)?;
		self.hardware.delay(timing.reset_pulse);

		// from here on there might be 12V on the target
		self.state = State::Programming;
		self.hardware.set_reset(false)?;
		self.hardware.delay(timing.high_voltage_settle);

		self.hardware.set_data_out_direction(Direction::Input)?;
		self.hardware.delay(timing.data_out_settle);

		Ok(())
	}

	pub fn write_fuse(&mut self, fuse: FuseWrite) -> crate::AResult<()> {
		ensure!(self.state == State::Programming, "Can't write {} fuse: session is {}", fuse.kind, self.state);
		self.hardware.write_fuse(fuse, self.ack)?;
		info!("Wrote {} fuse: 0x{:02x}", fuse.kind, fuse.value);
		Ok(())
	}

	/// Write low, high and extended fuse, in that order.
	pub fn program_fuses(&mut self, fuses: &FuseValues) -> crate::AResult<()> {
		for &fuse in fuses.writes().iter() {
			self.write_fuse(fuse)?;
		}
		Ok(())
	}

	pub fn exit(&mut self) -> crate::AResult<()> {
		ensure!(self.state == State::Programming, "Can't exit programming mode: session is {}", self.state);
		self.state = State::Done;
		self.hardware.set_reset(true)?;
		info!("Left high-voltage programming mode");
		Ok(())
	}
}

impl<'a, H: Hardware+?Sized> Drop for Session<'a, H> {
	fn drop(&mut self) {
		if self.state == State::Programming {
			warn!("Aborting programming session");
			if let Err(e) = self.exit() {
				error!("Couldn't leave high-voltage programming mode: {}", e);
			}
		}
	}
}

/// Run a full session: enter programming mode, write all fuses from the
/// configuration and leave programming mode again.
pub fn program<H: Hardware+?Sized>(hardware: &mut H, config: &ProgrammerConfig) -> crate::AResult<()> {
	let mut session = Session::new(hardware, config.ack);
	session.enter(&config.timing)?;
	session.program_fuses(&config.fuses)?;
	session.exit()
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::*;
	use crate::fuse::FuseKind;
	use crate::hvsp::AckTimeout;
	use crate::sim::{
		Activity,
		Event,
		SimulatedTarget,
	};

	#[test]
	fn entry_sequence() {
		let mut target = SimulatedTarget::new();
		let timing = EntryTiming::DEFAULT;
		{
			let mut session = Session::new(&mut target, AckPolicy::Forever);
			session.enter(&timing).unwrap();
			assert_eq!(session.state(), State::Programming);
			session.exit().unwrap();
			assert_eq!(session.state(), State::Done);
		}

		assert_eq!(target.events(), &[
			Event::DataOutDirection(Direction::Output),
			Event::Pins(OutPins::CLEAR),
			Event::Reset(true),
			Event::Delay(Duration::from_micros(20)),
			Event::Reset(false),
			Event::Delay(Duration::from_micros(10)),
			Event::DataOutDirection(Direction::Input),
			Event::Delay(Duration::from_micros(300)),
			Event::Reset(true),
		][..]);
		assert!(!target.in_programming_mode());
	}

	#[test]
	fn full_session_writes_low_high_extended() {
		let mut target = SimulatedTarget::new().with_busy_polls(1);
		program(&mut target, &ProgrammerConfig::DEFAULT).unwrap();

		assert_eq!(target.committed(), &[FuseKind::Low, FuseKind::High, FuseKind::Extended][..]);
		assert_eq!(target.fuse(FuseKind::Low), Some(0x62));
		assert_eq!(target.fuse(FuseKind::High), Some(0xdf));
		assert_eq!(target.fuse(FuseKind::Extended), Some(0xff));

		// no interleaving: each fuse's four frames are followed by its own
		// acknowledgment wait before the next fuse starts
		let mut expected = Vec::new();
		for fuse in FuseValues::DEFAULT.writes().iter() {
			for &(data, instruction) in fuse.frames().iter() {
				expected.push(Activity::Transfer { data, instruction });
			}
			expected.push(Activity::Poll(false));
			expected.push(Activity::Poll(true));
		}
		assert_eq!(target.activity(), &expected[..]);

		// high voltage removed at the end
		assert_eq!(target.events().last(), Some(&Event::Reset(true)));
		assert!(!target.in_programming_mode());
	}

	#[test]
	fn write_requires_programming_mode() {
		let mut target = SimulatedTarget::new();
		let mut session = Session::new(&mut target, AckPolicy::Forever);
		assert!(session.write_fuse(FuseWrite::new(FuseKind::Low, 0x62)).is_err());
		session.enter(&EntryTiming::DEFAULT).unwrap();
		session.exit().unwrap();
		assert!(session.write_fuse(FuseWrite::new(FuseKind::Low, 0x62)).is_err());
		// done is final
		assert!(session.enter(&EntryTiming::DEFAULT).is_err());
		assert!(session.exit().is_err());
		drop(session);
		assert!(target.transfers().is_empty());
	}

	#[test]
	fn timeout_aborts_session() {
		let mut target = SimulatedTarget::new().never_acknowledge();
		let config = ProgrammerConfig {
			ack: AckPolicy::Timeout(Duration::from_millis(5)),
			..ProgrammerConfig::DEFAULT
		};
		let err = program(&mut target, &config).unwrap_err();
		assert_eq!(err.downcast_ref::<AckTimeout>().map(|e| e.fuse), Some(FuseKind::Low));

		// nothing after the low fuse was attempted, and the session was
		// closed by dropping it
		assert_eq!(target.transfers().len(), 4);
		assert_eq!(target.events().last(), Some(&Event::Reset(true)));
		assert!(!target.in_programming_mode());
	}
}
