//! Plain-text transcript log enabled with `--log` or `/log`.

use std::error::Error;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn disabled() -> Self {
        LoggingState {
            file_path: None,
            is_active: false,
        }
    }

    /// Starts logging immediately when a file is given.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut logging = Self::disabled();
        if let Some(path) = log_file {
            logging.set_log_file(path)?;
        }
        Ok(logging)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn Error>> {
        OpenOptions::new().create(true).append(true).open(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;
        self.log_message(&format!(
            "## Logging started {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ))?;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn Error>> {
        let Some(path) = self.file_path.clone() else {
            return Err("No log file specified. Use /log <filename> to enable logging first.".into());
        };

        if self.is_active {
            self.log_message(&format!(
                "## Logging paused {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ))?;
            self.is_active = false;
            Ok(format!("Logging paused (file: {path})"))
        } else {
            self.is_active = true;
            Ok(format!("Logging resumed to: {path}"))
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn Error>> {
        let Some(path) = self.file_path.as_deref() else {
            return Ok(());
        };
        if !self.is_active {
            return Ok(());
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status_string(&self) -> String {
        let name = |path: &str| {
            Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", name(path)),
            (Some(path), false) => format!("paused ({})", name(path)),
        }
    }
}
