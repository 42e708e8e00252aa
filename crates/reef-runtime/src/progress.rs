use crate::host::HostEnvironment;

/// Forwards a completion fraction as-is. Values outside `0.0..=1.0` are the host's
/// concern.
pub fn report_progress<H: HostEnvironment + ?Sized>(host: &mut H, fraction: f32) {
    host.progress(fraction);
}

/// Asks the host to suspend the job for `seconds`. Advisory only.
pub fn yield_for<H: HostEnvironment + ?Sized>(host: &mut H, seconds: f32) {
    host.sleep(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, TestHost};

    #[test]
    fn forwards_without_clamping() {
        let mut host = TestHost::default();
        report_progress(&mut host, 0.5);
        report_progress(&mut host, 1.5);
        report_progress(&mut host, -0.25);
        yield_for(&mut host, 0.0);
        yield_for(&mut host, 2.0);
        assert_eq!(
            host.calls,
            vec![
                Call::Progress(0.5),
                Call::Progress(1.5),
                Call::Progress(-0.25),
                Call::Sleep(0.0),
                Call::Sleep(2.0),
            ]
        );
    }
}
