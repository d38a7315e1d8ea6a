//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use roofscan_core::{ProgressEvent, ProgressSink};

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of photos in the batch
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise only report skipped photos
    #[must_use]
    pub fn new(total: u64, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started {
                current,
                total,
                label,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total as u64);
                    bar.set_position(current.saturating_sub(1) as u64);
                    bar.set_message(label);
                }
            }
            ProgressEvent::Skipped {
                index,
                label,
                reason,
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(index as u64 + 1);
                    bar.println(format!("WARN: Skipping {label}: {reason}"));
                } else {
                    eprintln!("WARN: Skipping {label}: {reason}");
                }
            }
            ProgressEvent::Finished { processed, skipped } => {
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(format!(
                        "Done: {processed} processed, {skipped} skipped"
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(total: u64) -> ProgressBar {
        let bar = IndicatifBar::hidden();
        bar.set_length(total);
        ProgressBar {
            bar: Some(bar),
            quiet: false,
        }
    }

    fn position(progress: &ProgressBar) -> u64 {
        progress.bar.as_ref().map_or(0, IndicatifBar::position)
    }

    #[test]
    fn test_skipped_last_photo_completes_bar() {
        let progress = hidden(3);
        progress.on_event(ProgressEvent::Started {
            current: 3,
            total: 3,
            label: "vents.png".into(),
        });
        assert_eq!(position(&progress), 2);

        progress.on_event(ProgressEvent::Skipped {
            index: 2,
            label: "vents.png".into(),
            reason: "unreadable".into(),
        });
        assert_eq!(position(&progress), 3);
    }

    #[test]
    fn test_started_tracks_previous_photos() {
        let progress = hidden(4);
        progress.on_event(ProgressEvent::Started {
            current: 2,
            total: 4,
            label: "chimney.png".into(),
        });
        assert_eq!(position(&progress), 1);
    }

    #[test]
    fn test_quiet_has_no_bar() {
        let progress = ProgressBar::new(5, true, true);
        assert!(progress.bar.is_none());
    }
}
