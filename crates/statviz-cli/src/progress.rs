//! Spinners shown while a remote call is in flight.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

/// Spinner on stderr; hidden when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if io::stderr().is_terminal() {
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.enable_steady_tick(TICK);
    } else {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Run `work` behind a spinner labelled `message`.
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    let bar = spinner(message);
    let value = work();
    bar.finish_and_clear();
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_returns_work_value() {
        assert_eq!(with_spinner("Running ANOVA", || 42), 42);
    }
}
