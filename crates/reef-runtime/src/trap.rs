//! Fatal exits. A trap ends the module instance; the host sees it as a failed run.

use core::fmt::Write as _;

use crate::entry::Phase;
use crate::error::RuntimeError;
use crate::host::HostEnvironment;
use crate::log::LineBuf;

/// Logs `err` through the host and aborts the instance.
pub fn fatal<H: HostEnvironment + ?Sized>(host: &mut H, phase: Phase, err: &RuntimeError) -> ! {
    let code = err.trap_code();
    let mut line = LineBuf::new();
    let _ = write!(line, "reef: fatal while {phase}: {err} (trap {code})");
    host.log(line.as_bytes());
    abort(code)
}

/// Executes `unreachable` on wasm32. Elsewhere it panics so that emulated runs and
/// tests can observe the trap.
#[cfg(target_arch = "wasm32")]
pub fn abort(_code: i32) -> ! {
    core::arch::wasm32::unreachable()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn abort(code: i32) -> ! {
    panic!("reef trap {code}")
}

#[cfg(all(feature = "panic-handler", target_arch = "wasm32", not(test)))]
#[panic_handler]
fn on_panic(info: &core::panic::PanicInfo<'_>) -> ! {
    let mut line = LineBuf::new();
    let _ = write!(line, "PANIC: {info}");
    crate::host::ImportedHost::new().log(line.as_bytes());
    core::arch::wasm32::unreachable()
}
