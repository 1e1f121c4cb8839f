#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate avr_hvsp_fuses;
use avr_hvsp_fuses::*;

use std::io::{
	self,
	Write,
};
use std::process::exit;
use std::thread;
use std::time::Duration;

use avr_hvsp_fuses::config::DEFAULT_ACK_TIMEOUT;
use avr_hvsp_fuses::fuse::FuseKind;
use avr_hvsp_fuses::hvsp::AckPolicy;
use avr_hvsp_fuses::sim::{
	Activity,
	SimulatedTarget,
};

fn get_optional_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<Option<T>>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	param.parse::<T>().map(Some).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn report_simulation(target: &SimulatedTarget) {
	for activity in target.activity() {
		match *activity {
			Activity::Transfer { data, instruction } => {
				debug!("SDI 0x{:02x} SII 0x{:02x}", data, instruction);
			},
			Activity::Poll(ready) => {
				debug!("SDO {}", if ready { "high" } else { "low" });
			},
		}
	}
	for &kind in FuseKind::ALL.iter() {
		match target.fuse(kind) {
			Some(value) => info!("Simulated target {} fuse: 0x{:02x}", kind, value),
			None => warn!("Simulated target {} fuse not written", kind),
		}
	}
}

// status output; prints a dot every second forever unless `forever` is false
fn report_done(forever: bool) -> AResult<()> {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	write!(out, "Programming done")?;
	out.flush()?;
	if !forever {
		writeln!(out)?;
		return Ok(());
	}
	loop {
		thread::sleep(Duration::from_secs(1));
		write!(out, ".")?;
		out.flush()?;
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg simulate: -s --simulate "Program a simulated target instead of the GPIO lines")
		(@arg ack_timeout: -t --("ack-timeout") +takes_value "Milliseconds to wait for the target to acknowledge each fuse write (default: 100)")
		(@arg wait_forever: --("wait-forever") "Wait for acknowledgments without timeout")
		(@arg realtime: --realtime "Lock memory and use realtime scheduling while programming")
		(@arg no_status_loop: --("no-status-loop") "Exit after programming instead of printing progress dots")
	).get_matches();

	let ack_timeout: Option<u64> = get_optional_param(&matches, "ack_timeout")?;
	let wait_forever = matches.is_present("wait_forever");
	ensure!(!(wait_forever && ack_timeout.is_some()), "--ack-timeout and --wait-forever are mutually exclusive");

	let ack = if wait_forever {
		AckPolicy::Forever
	} else {
		AckPolicy::Timeout(ack_timeout.map(Duration::from_millis).unwrap_or(DEFAULT_ACK_TIMEOUT))
	};
	let config = ProgrammerConfig {
		ack,
		..ProgrammerConfig::DEFAULT
	};
	log_fuse_plan(&config);

	if matches.is_present("realtime") {
		realtime::enable()?;
	}

	let status_loop = !matches.is_present("no_status_loop");
	if matches.is_present("simulate") {
		let mut target = SimulatedTarget::new().with_busy_polls(3);
		hvsp::program(&mut target, &config)?;
		report_simulation(&target);
		report_done(status_loop)
	} else {
		// keep the lines (and the target's reset) configured while reporting
		let mut gpio = gpio::SysfsGpio::open(&config.pins)?;
		hvsp::program(&mut gpio, &config)?;
		report_done(status_loop)
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
