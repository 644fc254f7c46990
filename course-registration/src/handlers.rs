use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogStore,
    connection::Connection,
    dispatch::CommandHandler,
    error::ServerError,
    model::{RegistrationForm, Session},
    protocol::Verb,
    registrations::RegistrationLog,
};

/// Answers `LOAD <term>` with the courses offered in that term.
pub struct LoadHandler {
    catalog: CatalogStore,
}

impl LoadHandler {
    pub fn new(catalog: CatalogStore) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CommandHandler for LoadHandler {
    async fn handle(
        &self,
        verb: &str,
        argument: &str,
        connection: &mut Connection,
    ) -> Result<(), ServerError> {
        if Verb::from_wire(verb) != Some(Verb::Load) {
            return Ok(());
        }

        let courses = match argument.parse::<Session>() {
            Ok(session) => self.catalog.courses_for_session(session).await?,
            Err(err) => {
                // No catalog record can carry an unknown term.
                warn!(peer = ?connection.peer(), error = %err, "load requested for unknown term");
                Vec::new()
            }
        };

        debug!(term = argument, count = courses.len(), "sending course list");
        connection.send(&courses).await
    }
}

/// Stores the form that follows `REGISTER` and confirms it to the client.
pub struct RegisterHandler {
    log: RegistrationLog,
}

impl RegisterHandler {
    pub fn new(log: RegistrationLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl CommandHandler for RegisterHandler {
    async fn handle(
        &self,
        verb: &str,
        _argument: &str,
        connection: &mut Connection,
    ) -> Result<(), ServerError> {
        if Verb::from_wire(verb) != Some(Verb::Register) {
            return Ok(());
        }

        let form: RegistrationForm = connection.read_payload("registration form").await?;
        self.log.append(&form).await?;
        info!(
            student_id = %form.student_id,
            code = %form.course.code,
            session = %form.course.session,
            "registration recorded"
        );

        connection.send(&form.confirmation()).await
    }
}
