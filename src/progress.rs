//! Progress reporting on stderr using the `indicatif` crate.
//!
//! Bars are used where the amount of work is known up front (drawing random
//! subsets, clustering a fixed pool); spinners are used while streaming
//! records from stdin where the record count is unknown.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar of a specified length with desired styling.
pub fn progress_bar(len: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(len);
    progress_bar.set_style(ProgressStyle::default_bar().template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {percent}% [{human_pos}/{human_len}] [Remaining: {eta}]",
    ).expect("Invalid progress style."));

    progress_bar
}

/// Create a spinner counting records processed, labelled with `msg`.
pub fn progress_spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template(
        "[{elapsed_precise}] {spinner:.cyan} {human_pos} records [{per_sec}] [{msg}]",
    ).expect("Invalid progress style."));
    spinner.set_message(msg);

    spinner
}
