//! The host's side of the ABI, as a capability the runtime is handed.
//!
//! Inside a wasm module the capability is [`ImportedHost`], a zero-sized handle over
//! the `reef` import module. Everywhere else (tests, dry runs) any implementation of
//! [`HostEnvironment`] can stand in for it.

use crate::result::ResultKind;

/// One method per host import. Every call is synchronous and infallible from the
/// module's point of view; a host that wants to reject a call traps the instance.
pub trait HostEnvironment {
    /// True byte length of the job input.
    fn dataset_len(&mut self) -> usize;

    /// Copy the job input into `dest`, which is exactly `dataset_len()` bytes long.
    fn dataset_write(&mut self, dest: &mut [u8]);

    fn emit_result(&mut self, kind: ResultKind, payload: &[u8]);

    fn log(&mut self, message: &[u8]);

    fn progress(&mut self, fraction: f32);

    fn sleep(&mut self, seconds: f32);
}

impl<H: HostEnvironment + ?Sized> HostEnvironment for &mut H {
    fn dataset_len(&mut self) -> usize {
        (**self).dataset_len()
    }

    fn dataset_write(&mut self, dest: &mut [u8]) {
        (**self).dataset_write(dest)
    }

    fn emit_result(&mut self, kind: ResultKind, payload: &[u8]) {
        (**self).emit_result(kind, payload)
    }

    fn log(&mut self, message: &[u8]) {
        (**self).log(message)
    }

    fn progress(&mut self, fraction: f32) {
        (**self).progress(fraction)
    }

    fn sleep(&mut self, seconds: f32) {
        (**self).sleep(seconds)
    }
}

#[cfg(target_arch = "wasm32")]
pub use self::imported::ImportedHost;

#[cfg(target_arch = "wasm32")]
mod imported {
    use super::HostEnvironment;
    use crate::result::ResultKind;

    // Wire names must match `reef_contracts::IMPORT_*`.
    #[link(wasm_import_module = "reef")]
    extern "C" {
        #[link_name = "dataset_len"]
        fn reef_dataset_len() -> usize;
        #[link_name = "dataset_write"]
        fn reef_dataset_write(ptr: *mut u8);
        #[link_name = "result"]
        fn reef_result(kind: u32, ptr: *const u8, len: usize);
        #[link_name = "log"]
        fn reef_log(ptr: *const u8, len: usize);
        #[link_name = "progress"]
        fn reef_progress(done: f32);
        #[link_name = "sleep"]
        fn reef_sleep(seconds: f32);
    }

    /// Handle over the `reef` imports. Stateless; any number may exist.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ImportedHost;

    impl ImportedHost {
        pub const fn new() -> Self {
            ImportedHost
        }
    }

    impl HostEnvironment for ImportedHost {
        fn dataset_len(&mut self) -> usize {
            unsafe { reef_dataset_len() }
        }

        fn dataset_write(&mut self, dest: &mut [u8]) {
            // SAFETY: `dest` is writable for exactly the dataset length the host
            // reported, which is all the host writes.
            unsafe { reef_dataset_write(dest.as_mut_ptr()) }
        }

        fn emit_result(&mut self, kind: ResultKind, payload: &[u8]) {
            unsafe { reef_result(kind.discriminant(), payload.as_ptr(), payload.len()) }
        }

        fn log(&mut self, message: &[u8]) {
            unsafe { reef_log(message.as_ptr(), message.len()) }
        }

        fn progress(&mut self, fraction: f32) {
            unsafe { reef_progress(fraction) }
        }

        fn sleep(&mut self, seconds: f32) {
            unsafe { reef_sleep(seconds) }
        }
    }
}
