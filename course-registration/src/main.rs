use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use course_registration::{
    cli::{Cli, Command, LoadArgs, RegisterArgs},
    client,
    model::RegistrationForm,
    server::Server,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => {
            let config = args.into_config();
            let server = Server::bind(&config)
                .await
                .with_context(|| format!("failed to bind {}", config.listen))?;
            info!(
                addr = %server.local_addr()?,
                catalog = %config.catalog_path.display(),
                registrations = %config.registrations_path.display(),
                "server listening"
            );
            server.run_until_ctrl_c().await;
        }
        Command::Load(args) => load(args).await?,
        Command::Register(args) => register(args).await?,
    }

    Ok(())
}

async fn load(args: LoadArgs) -> Result<()> {
    let courses = client::load_courses(args.server, args.session).await?;
    if courses.is_empty() {
        println!("No courses offered in {}.", args.session);
    }
    for (index, course) in courses.iter().enumerate() {
        println!("{}. {}\t{}", index + 1, course.code, course.name);
    }
    Ok(())
}

async fn register(args: RegisterArgs) -> Result<()> {
    // The server takes the course as sent, so resolve it against the catalog first.
    let courses = client::load_courses(args.server, args.session)
        .await
        .context("failed to load the course list")?;
    let course = client::find_course(&courses, &args.code, args.session)?;

    let form = RegistrationForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        student_id: args.student_id,
        course,
    };
    let confirmation = client::register(args.server, &form).await?;
    println!("{confirmation}");
    Ok(())
}
