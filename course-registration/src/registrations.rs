use std::path::{Path, PathBuf};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::{error::RegistrationError, model::RegistrationForm};

const SEPARATORS: &[char] = &['\t', '\r', '\n'];

/// Append-only log of accepted registrations, one tab-separated line each.
///
/// Lines are never rewritten or removed. Duplicate registrations are stored
/// as they arrive.
#[derive(Debug, Clone)]
pub struct RegistrationLog {
    path: PathBuf,
}

impl RegistrationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, creating the log file if needed.
    ///
    /// A field holding a tab or line break would split or forge records, so
    /// such a form is refused before the file is touched.
    pub async fn append(&self, form: &RegistrationForm) -> Result<(), RegistrationError> {
        check_fields(form)?;
        let mut record = form.record_line();
        record.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        // tokio hands the write to a blocking thread; flush waits for it to land.
        file.flush().await?;
        Ok(())
    }
}

fn check_fields(form: &RegistrationForm) -> Result<(), RegistrationError> {
    let fields = [
        ("course code", &form.course.code),
        ("student id", &form.student_id),
        ("first name", &form.first_name),
        ("last name", &form.last_name),
        ("email", &form.email),
    ];
    match fields.iter().find(|(_, value)| value.contains(SEPARATORS)) {
        Some(&(field, _)) => Err(RegistrationError::SeparatorInField { field }),
        None => Ok(()),
    }
}
