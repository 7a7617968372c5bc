use crate::config::UploadSettings;
use crate::models::upload::CandidateFile;

/// Drop-zone filter in front of every question card.
#[derive(Debug, Clone)]
pub struct FilePicker {
    accepted_extensions: Vec<String>,
    max_files: usize,
}

impl FilePicker {
    pub fn new(settings: &UploadSettings) -> Self {
        Self {
            accepted_extensions: settings
                .accepted_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_files: settings.max_files.max(1),
        }
    }

    /// Human readable list for error messages, e.g. "MP4, MOV, AVI, WEBM".
    pub fn accepted_formats(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|ext| ext.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_accepted(&self, file: &CandidateFile) -> bool {
        let extension_ok = file
            .extension()
            .is_some_and(|ext| self.accepted_extensions.contains(&ext));

        let mime_ok = match file.mime_type.as_deref() {
            None | Some("") => true,
            Some(mime) => mime.to_ascii_lowercase().starts_with("video/"),
        };

        extension_ok && mime_ok
    }

    /// Files that survive the filter, capped at `max_files` in drop order.
    pub fn accept(&self, files: Vec<CandidateFile>) -> Vec<CandidateFile> {
        let dropped = files.len();
        let accepted: Vec<CandidateFile> = files
            .into_iter()
            .filter(|file| self.is_accepted(file))
            .take(self.max_files)
            .collect();

        if accepted.len() < dropped {
            tracing::debug!(
                dropped,
                accepted = accepted.len(),
                "File picker discarded files"
            );
        }

        accepted
    }
}

impl Default for FilePicker {
    fn default() -> Self {
        Self::new(&UploadSettings::default())
    }
}
