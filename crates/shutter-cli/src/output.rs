//! Output formatting helpers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use shutter_core::models::{Comment, Follow, Post, UserProfile};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a note to stderr, out of the way of piped output.
pub fn note(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

/// A list item printable as one line.
pub trait Row: Serialize {
    fn line(&self) -> String;
}

impl Row for Post {
    fn line(&self) -> String {
        let mut line = format!(
            "{} {} {}",
            timestamp(&self.created_at).dimmed(),
            self.author.as_str().cyan(),
            self.caption
        );
        if let Some(image) = &self.image_url {
            line.push_str(&format!(" {}", image.blue().underline()));
        }
        line.push_str(&format!(" {}", format!("[{}]", self.id).dimmed()));
        line
    }
}

impl Row for Comment {
    fn line(&self) -> String {
        format!(
            "{} {} {}",
            timestamp(&self.created_at).dimmed(),
            self.author.as_str().cyan(),
            self.text
        )
    }
}

impl Row for UserProfile {
    fn line(&self) -> String {
        format!(
            "{} {} {}",
            self.username.as_str().bold(),
            self.full_name,
            format!("[{}]", self.id).dimmed()
        )
    }
}

impl Row for Follow {
    fn line(&self) -> String {
        format!(
            "{} {} {} {}",
            timestamp(&self.created_at).dimmed(),
            self.follower.as_str().cyan(),
            "→".dimmed(),
            self.followee.as_str().cyan()
        )
    }
}

/// Prints rows as text or JSON lines.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn row<T: Row>(&self, item: &T) -> Result<()> {
        if self.json {
            json(item)
        } else {
            println!("{}", item.line());
            Ok(())
        }
    }

    /// A row that arrived after the initial listing.
    pub fn live_row<T: Row>(&self, item: &T) -> Result<()> {
        if self.json {
            json(item)
        } else {
            println!("{} {}", "NEW".green().bold(), item.line());
            Ok(())
        }
    }
}
