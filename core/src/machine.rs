use crate::command::Command;

/// Machine-agnostic interface for the emulation core.
///
/// The platform layer drives a `Machine` once per tick: it drains input
/// events into the report methods, asks the machine to render one frame
/// into the shared source buffer, then scales and presents the result.
/// The machine never calls back into the platform layer.
pub trait Machine {
    /// Run one frame of emulation and render it into `screen`.
    ///
    /// `screen` is a view into the platform layer's source buffer, RGB565,
    /// one `u16` per pixel, rows `pitch` pixels apart. The machine writes at
    /// its current output resolution and returns that `(width, height)`;
    /// width never exceeds twice the native width and height never exceeds
    /// twice the extended native height (interlaced output). The platform
    /// layer picks a scaling routine from the returned size every frame.
    fn run_frame(&mut self, screen: &mut [u16], pitch: usize) -> (usize, usize);

    /// A bound button command changed state. `pressed` is true for
    /// key/button-down, false for up. Called per-event, between frames;
    /// the machine latches state until the next `run_frame`.
    fn report_button(&mut self, command: &Command, pressed: bool);

    /// A bound analog axis moved. `value` is the raw signed axis position.
    fn report_axis(&mut self, command: &Command, value: i16);

    /// The bound pointer source moved to window coordinates `(x, y)`.
    fn report_pointer(&mut self, command: &Command, x: i16, y: i16);

    /// Orderly shutdown: flush any persistent state. Called exactly once,
    /// after the quit flag is acted upon and before teardown.
    fn exit(&mut self);
}
