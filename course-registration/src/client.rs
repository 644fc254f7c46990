use std::{io, net::SocketAddr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};
use tracing::{debug, warn};

use crate::{
    model::{Course, RegistrationForm, Session},
    protocol::{Command, read_message, write_message},
};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

static STUDENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("student id pattern"));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to reach server at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("server closed the connection without answering")]
    NoResponse,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("student id must be exactly 6 digits, got '{0}'")]
    InvalidStudentId(String),
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error("course {code} is not offered in {session}")]
    UnknownCourse { code: String, session: Session },
}

/// Checks the fields the server stores without looking at.
pub fn validate_form(form: &RegistrationForm) -> Result<(), ClientError> {
    if form.first_name.trim().is_empty() {
        return Err(ClientError::MissingField { field: "first name" });
    }
    if form.last_name.trim().is_empty() {
        return Err(ClientError::MissingField { field: "last name" });
    }
    if !EMAIL.is_match(&form.email) {
        return Err(ClientError::InvalidEmail(form.email.clone()));
    }
    if !STUDENT_ID.is_match(&form.student_id) {
        return Err(ClientError::InvalidStudentId(form.student_id.clone()));
    }
    Ok(())
}

/// Finds the course with `code` in a list previously returned by the server.
pub fn find_course(courses: &[Course], code: &str, session: Session) -> Result<Course, ClientError> {
    courses
        .iter()
        .find(|course| course.code == code)
        .cloned()
        .ok_or_else(|| ClientError::UnknownCourse {
            code: code.to_string(),
            session,
        })
}

/// Asks the server for the courses offered in `session`.
pub async fn load_courses(server: SocketAddr, session: Session) -> Result<Vec<Course>, ClientError> {
    let (mut reader, mut writer) = connect(server).await?;
    write_message(&mut writer, &Command::load(session).to_line()).await?;

    let courses = read_message::<_, Vec<Course>>(&mut reader)
        .await?
        .ok_or(ClientError::NoResponse)?;
    debug!(%session, count = courses.len(), "courses loaded");

    shutdown(&mut writer).await;
    Ok(courses)
}

/// Validates and submits `form`, returning the server's confirmation.
pub async fn register(server: SocketAddr, form: &RegistrationForm) -> Result<String, ClientError> {
    validate_form(form)?;

    let (mut reader, mut writer) = connect(server).await?;
    write_message(&mut writer, &Command::register().to_line()).await?;
    write_message(&mut writer, form).await?;

    let confirmation = read_message::<_, String>(&mut reader)
        .await?
        .ok_or(ClientError::NoResponse)?;

    shutdown(&mut writer).await;
    Ok(confirmation)
}

async fn connect(server: SocketAddr) -> Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf), ClientError> {
    let stream = TcpStream::connect(server)
        .await
        .map_err(|source| ClientError::Connect {
            addr: server,
            source,
        })?;
    let (reader, writer) = stream.into_split();
    Ok((BufReader::new(reader), writer))
}

async fn shutdown(writer: &mut OwnedWriteHalf) {
    if let Err(error) = writer.shutdown().await {
        warn!(?error, "failed to shutdown client writer cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana.silva@umontreal.ca".into(),
            student_id: "123456".into(),
            course: Course::new("Programmation", "LOG300", Session::Fall),
        }
    }

    #[test]
    fn accepts_well_formed_form() {
        validate_form(&form()).expect("valid form");
    }

    #[test]
    fn rejects_bad_email() {
        for email in ["", "ana", "ana@umontreal", "ana@@umontreal.ca", "ana silva@umontreal.ca"] {
            let form = RegistrationForm {
                email: email.into(),
                ..form()
            };
            assert!(
                matches!(validate_form(&form), Err(ClientError::InvalidEmail(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_student_id_that_is_not_six_digits() {
        for student_id in ["", "12345", "1234567", "12345a"] {
            let form = RegistrationForm {
                student_id: student_id.into(),
                ..form()
            };
            assert!(
                matches!(validate_form(&form), Err(ClientError::InvalidStudentId(_))),
                "{student_id} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_blank_names() {
        let form = RegistrationForm {
            last_name: "  ".into(),
            ..form()
        };
        assert!(matches!(
            validate_form(&form),
            Err(ClientError::MissingField { field: "last name" })
        ));
    }

    #[test]
    fn finds_course_by_code() {
        let courses = [
            Course::new("Programmation1", "IFT1015", Session::Fall),
            Course::new("Programmation", "LOG300", Session::Fall),
        ];
        assert_eq!(
            find_course(&courses, "LOG300", Session::Fall).expect("known course").name,
            "Programmation"
        );
        assert!(matches!(
            find_course(&courses, "IFT9999", Session::Fall),
            Err(ClientError::UnknownCourse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connect_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = load_courses(addr, Session::Fall)
            .await
            .expect_err("nobody is listening");
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
