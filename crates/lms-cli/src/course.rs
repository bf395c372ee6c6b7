//! # Course Subcommands
//!
//! - `create`: Create a course authored by `--author`.
//! - `list`: List courses newest first, optionally filtered.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use lms_core::{AuthorId, Clock, CourseDraft, CourseQuery, CourseRecord, Subject};
use lms_store::Datastore;

use crate::{write_json, EXIT_OK};

/// Arguments for the `lms course` subcommand.
#[derive(Args, Debug)]
pub struct CourseArgs {
    #[command(subcommand)]
    pub command: CourseCommand,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// Create a course.
    Create {
        /// User id recorded as the course author.
        #[arg(long)]
        author: String,
        #[arg(long)]
        name: String,
        /// cpp, python, cybersecurity, cryptography, webdev, or general-skills.
        #[arg(long)]
        subject: String,
        #[arg(long)]
        topic: String,
        /// Minutes, 1 to 1440.
        #[arg(long)]
        duration: u32,
    },

    /// List courses, newest first.
    List {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        /// Page size (default 10, max 100).
        #[arg(long)]
        limit: Option<u32>,
        /// 1-based page number.
        #[arg(long)]
        page: Option<u32>,
    },
}

/// Dispatch a course subcommand.
pub async fn run_course(
    args: &CourseArgs,
    store: Arc<dyn Datastore>,
    clock: Arc<dyn Clock>,
    json: bool,
    out: &mut dyn Write,
) -> Result<u8> {
    match &args.command {
        CourseCommand::Create {
            author,
            name,
            subject,
            topic,
            duration,
        } => {
            let draft = CourseDraft {
                name: name.clone(),
                subject: subject.clone(),
                topic: topic.clone(),
                duration: *duration,
            };
            let author = AuthorId::new(author.as_str()).ok();
            let course = lms_courses::create_course(
                store.as_ref(),
                clock.as_ref(),
                author.as_ref(),
                &draft,
            )
            .await
            .context("course was not created")?;

            if json {
                write_json(out, &course)?;
            } else {
                writeln!(out, "Course created")?;
                print_course(out, &course)?;
            }
            Ok(EXIT_OK)
        }
        CourseCommand::List {
            subject,
            topic,
            limit,
            page,
        } => {
            let subject = subject
                .as_deref()
                .map(str::parse::<Subject>)
                .transpose()
                .context("--subject is not a known subject")?;
            let query = CourseQuery {
                limit: *limit,
                page: *page,
                subject,
                topic: topic.clone(),
            };
            let courses = lms_courses::list_courses(store.as_ref(), &query)
                .await
                .context("courses could not be listed")?;

            if json {
                write_json(out, &courses)?;
            } else if courses.is_empty() {
                writeln!(out, "No courses found")?;
            } else {
                for course in &courses {
                    print_course(out, course)?;
                }
            }
            Ok(EXIT_OK)
        }
    }
}

fn print_course(out: &mut dyn Write, course: &CourseRecord) -> Result<()> {
    writeln!(
        out,
        "{}  {} [{}] {} ({} min) by {}",
        course.id,
        course.name,
        course.subject.display_name(),
        course.topic,
        course.duration,
        course.author,
    )?;
    Ok(())
}
