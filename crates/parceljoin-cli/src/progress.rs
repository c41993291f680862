use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parceljoin_pipeline::{PipelinePhase, PipelineProgress};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// One spinner per pipeline phase, finished when the next phase starts
pub struct BuildProgress {
    multi: MultiProgress,
    active: Option<(PipelinePhase, ProgressBar)>,
}

impl BuildProgress {
    pub fn new() -> Self {
        Self { multi: MultiProgress::new(), active: None }
    }

    pub fn update(&mut self, progress: &PipelineProgress) {
        if let Some((phase, bar)) = &self.active {
            if *phase == progress.phase {
                bar.set_message(progress.message.clone());
                return;
            }
        }

        self.finish_active();
        let bar = self.multi.add(create_spinner(&progress.message));
        self.active = Some((progress.phase, bar));
    }

    /// Mark the last phase done
    pub fn finish(mut self) {
        self.finish_active();
    }

    /// Mark the running phase failed
    pub fn fail(mut self) {
        if let Some((phase, bar)) = self.active.take() {
            finish_error(&bar, &format!("{} failed", phase.label()));
        }
    }

    fn finish_active(&mut self) {
        if let Some((phase, bar)) = self.active.take() {
            finish_success(&bar, &format!("{}: {}", phase.label(), bar.message()));
        }
    }
}
