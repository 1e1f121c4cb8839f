//! Reduce scheduling jitter while bit-banging

use std::io;
use std::mem;

use libc::{
	MCL_CURRENT,
	MCL_FUTURE,
	SCHED_FIFO,
	mlockall,
	sched_get_priority_max,
	sched_param,
	sched_setscheduler,
};

/// Lock all pages into memory and switch the process to `SCHED_FIFO` with
/// the highest priority. Usually needs root (or CAP_SYS_NICE and
/// CAP_IPC_LOCK).
pub fn enable() -> crate::AResult<()> {
	if 0 != unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) } {
		bail!("mlockall failed: {}", io::Error::last_os_error());
	}

	let priority = unsafe { sched_get_priority_max(SCHED_FIFO) };
	if priority < 0 {
		bail!("sched_get_priority_max failed: {}", io::Error::last_os_error());
	}
	let mut param: sched_param = unsafe { mem::zeroed() };
	param.sched_priority = priority;
	if 0 != unsafe { sched_setscheduler(0, SCHED_FIFO, &param) } {
		bail!("sched_setscheduler failed: {}", io::Error::last_os_error());
	}

	debug!("Running with SCHED_FIFO priority {}", priority);
	Ok(())
}
