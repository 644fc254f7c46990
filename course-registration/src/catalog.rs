use std::path::PathBuf;

use tokio::fs;

use crate::{
    error::CatalogError,
    model::{Course, Session},
};

/// Read-only view over the tab-separated course catalog.
///
/// Every query re-reads the file, so edits to the catalog are visible to the
/// next `LOAD` without restarting the server. Nothing is cached.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Courses offered in `session`, in catalog order.
    ///
    /// A single malformed line fails the whole query.
    pub async fn courses_for_session(&self, session: Session) -> Result<Vec<Course>, CatalogError> {
        let contents = fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;

        let courses = parse_catalog(&contents)?;
        Ok(courses
            .into_iter()
            .filter(|course| course.session == session)
            .collect())
    }
}

/// Parses catalog text, one `code\tname\tsession` record per line.
pub fn parse_catalog(contents: &str) -> Result<Vec<Course>, CatalogError> {
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.is_empty())
        .map(|(number, line)| parse_record(number, line))
        .collect()
}

fn parse_record(line: usize, text: &str) -> Result<Course, CatalogError> {
    let fields: Vec<&str> = text.split('\t').collect();
    let &[code, name, session] = fields.as_slice() else {
        return Err(CatalogError::MalformedLine {
            line,
            found: fields.len(),
        });
    };

    let session = session
        .parse()
        .map_err(|source| CatalogError::UnknownSession { line, source })?;
    Ok(Course::new(name, code, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = "IFT1015\tProgrammation1\tAutomne\n\
                           IFT1025\tProgrammation2\tHiver\n\
                           LOG300\tProgrammation\tautomne\n\
                           IFT2255\tGenie logiciel\tEte\n";

    #[test]
    fn parses_records_in_file_order() {
        let courses = parse_catalog(CATALOG).expect("parse catalog");
        let codes: Vec<&str> = courses.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["IFT1015", "IFT1025", "LOG300", "IFT2255"]);
        assert_eq!(
            courses[2],
            Course::new("Programmation", "LOG300", Session::Fall)
        );
    }

    #[test]
    fn tolerates_crlf_and_empty_lines() {
        let courses =
            parse_catalog("IFT1015\tProgrammation1\tAutomne\r\n\r\nIFT1025\tProgrammation2\tHiver\r\n")
                .expect("parse catalog");
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[1].name, "Programmation2");
    }

    #[test]
    fn wrong_field_count_fails_the_whole_catalog() {
        let err = parse_catalog("IFT1015\tProgrammation1\tAutomne\nIFT1025 Programmation2 Hiver\n")
            .expect_err("second line is malformed");
        assert!(matches!(err, CatalogError::MalformedLine { line: 2, found: 1 }));

        let err = parse_catalog("IFT1015\tProgrammation1\tAutomne\textra\n")
            .expect_err("too many fields");
        assert!(matches!(err, CatalogError::MalformedLine { line: 1, found: 4 }));
    }

    #[test]
    fn unknown_session_fails_the_whole_catalog() {
        let err = parse_catalog("IFT1015\tProgrammation1\tPrintemps\n").expect_err("bad session");
        assert!(matches!(err, CatalogError::UnknownSession { line: 1, .. }));
    }

    #[tokio::test]
    async fn filters_by_session_on_every_read() {
        let mut file = tempfile::NamedTempFile::new().expect("temp catalog");
        file.write_all(CATALOG.as_bytes()).expect("write catalog");
        let store = CatalogStore::new(file.path());

        let fall = store
            .courses_for_session(Session::Fall)
            .await
            .expect("load fall");
        let codes: Vec<&str> = fall.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["IFT1015", "LOG300"]);

        file.write_all(b"IFT3913\tQualite\tAutomne\n").expect("append course");
        let fall = store
            .courses_for_session(Session::Fall)
            .await
            .expect("reload fall");
        assert_eq!(fall.len(), 3);
        assert_eq!(fall[2].code, "IFT3913");
    }

    #[tokio::test]
    async fn missing_catalog_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = CatalogStore::new(dir.path().join("absent.txt"));

        let err = store
            .courses_for_session(Session::Winter)
            .await
            .expect_err("catalog is missing");
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
