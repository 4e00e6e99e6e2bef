use std::panic::Location;

use log::error;

/// Runs `f` inside a validation error scope and logs whatever the device
/// reports, tagged with the caller's location. Errors never change control
/// flow.
#[track_caller]
pub fn checked<R>(device: &wgpu::Device, what: &str, f: impl FnOnce() -> R) -> R {
    let location = Location::caller();
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let result = f();
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        report(what, location, &err);
    }
    result
}

fn report(what: &str, location: &Location<'_>, err: &wgpu::Error) {
    error!(
        "GPU error during {what} at {}:{}: {err}",
        location.file(),
        location.line()
    );
}
