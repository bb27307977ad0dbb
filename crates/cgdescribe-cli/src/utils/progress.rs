use cgdescribe::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;
const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";

/// Renders describe progress on stderr: a bar over the input structures, labelled with
/// the structure currently being described.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(Self::style());
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |event: Progress| {
            let Ok(pb) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            Self::apply(&pb, event);
        })
    }

    fn apply(pb: &ProgressBar, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_message(name);
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                pb.set_length(total_steps);
                pb.set_position(0);
            }
            Progress::StructureStart { index, name } => {
                pb.set_message(format!("#{} {}", index, name));
            }
            Progress::TaskIncrement => pb.inc(1),
            Progress::TaskFinish => {
                if let Some(len) = pb.length() {
                    pb.set_position(len);
                }
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                pb.finish_with_message(format!("✓ Described {} structure(s)", pb.position()));
            }
            Progress::Message(msg) => pb.println(format!("  {}", msg)),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = hidden();
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn bar_follows_structures_through_a_run() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Describing structures",
        });
        callback(Progress::TaskStart { total_steps: 3 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.message(), "Describing structures");
            assert_eq!(pb.length(), Some(3));
            assert!(!pb.is_finished());
        }

        callback(Progress::StructureStart {
            index: 1,
            name: "1GID_A".to_string(),
        });
        callback(Progress::TaskIncrement);
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.message(), "#1 1GID_A");
            assert_eq!(pb.position(), 1);
        }

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 3);
        assert_eq!(pb.message(), "✓ Described 3 structure(s)");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Describing structures",
            });
            callback(Progress::TaskStart { total_steps: 1 });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 1);
    }
}
