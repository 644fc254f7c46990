use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Academic term a course is offered in.
///
/// The wire and file representation is the French term name used by the
/// catalog (`Automne`, `Hiver`, `Ete`). Parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Session {
    #[serde(rename = "Automne")]
    Fall,
    #[serde(rename = "Hiver")]
    Winter,
    #[serde(rename = "Ete")]
    Summer,
}

impl Session {
    pub const ALL: [Session; 3] = [Session::Fall, Session::Winter, Session::Summer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Fall => "Automne",
            Session::Winter => "Hiver",
            Session::Summer => "Ete",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session '{0}', expected one of Automne, Hiver, Ete")]
pub struct UnknownSession(pub String);

impl FromStr for Session {
    type Err = UnknownSession;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(session) = Session::ALL
            .into_iter()
            .find(|session| text.eq_ignore_ascii_case(session.as_str()))
        {
            return Ok(session);
        }

        // Console users type the accented spelling.
        if text.to_lowercase() == "été" {
            return Ok(Session::Summer);
        }

        Err(UnknownSession(text.to_string()))
    }
}

impl TryFrom<String> for Session {
    type Error = UnknownSession;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

/// A course offering as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub code: String,
    pub session: Session,
}

impl Course {
    pub fn new(name: impl Into<String>, code: impl Into<String>, session: Session) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            session,
        }
    }
}

/// Registration submitted by a client for one course.
///
/// Field formats (email shape, 6-digit student id) are checked on the client
/// side; the server stores whatever it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub student_id: String,
    pub course: Course,
}

impl RegistrationForm {
    /// Tab-separated log line: session, code, student id, first name, last name, email.
    pub fn record_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.course.session,
            self.course.code,
            self.student_id,
            self.first_name,
            self.last_name,
            self.email
        )
    }

    /// Message sent back to the client once the registration is stored.
    pub fn confirmation(&self) -> String {
        format!(
            "Félicitations! Inscription réussie de {} au cours {}.",
            self.first_name, self.course.code
        )
    }
}
