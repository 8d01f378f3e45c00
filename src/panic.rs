use std::{fmt::Write, panic};

pub fn setup_panic_hook() {
    panic::set_hook(Box::new(panic_hook));
}

#[allow(deprecated)]
fn panic_hook(info: &panic::PanicInfo) {
    let mut fmt_error = String::new();
    let _ = writeln!(fmt_error, "{}", info);

    // Backtraces are unavailable on the wasm host; the location is all we get.
    if let Some(location) = info.location() {
        let _ = writeln!(fmt_error, "at {}:{}", location.file(), location.line());
    }

    log::error!("{}", fmt_error);
}
