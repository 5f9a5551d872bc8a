use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ApiProgress {
    bar: ProgressBar,
}

impl ApiProgress {
    fn spinner(template: &str, message: String, tick: Duration) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(tick);

        Self { bar }
    }

    pub fn new_upload(what: &str) -> Self {
        Self::spinner(
            "🚀 {msg} {spinner:.green}",
            format!("Uploading {what}..."),
            Duration::from_millis(80),
        )
    }

    pub fn new_polling(project_id: &str) -> Self {
        Self::spinner(
            "⏳ {msg} {spinner:.yellow} [{elapsed}]",
            format!("Waiting for project {project_id}..."),
            Duration::from_millis(120),
        )
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
