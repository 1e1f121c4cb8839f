#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod config;
pub mod fuse;
pub mod gpio;
pub mod hvsp;
pub mod realtime;
pub mod sim;

pub use self::config::ProgrammerConfig;

/// Log what is going to be written, including settings that lock out ISP.
pub fn log_fuse_plan(config: &ProgrammerConfig) {
	for write in config.fuses.writes().iter() {
		let bits = fuse::describe(write.kind, write.value);
		info!("Target {}", bits);
		for warning in bits.warnings() {
			warn!("{}: {}", write.kind, warning);
		}
	}
}
