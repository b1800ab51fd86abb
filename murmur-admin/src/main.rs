use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use murmur_server::db::{
    repositories::{PostRepository, UserRepository},
    Database,
};
use std::io::Write;

/// Murmur database administration
///
/// Creates the schema, reports table sizes and removes users or posts
/// together with everything that cascades from them.
#[derive(Parser, Debug)]
#[command(name = "murmur-admin")]
#[command(about = "Operator tooling for the Murmur database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, default_value = "./murmur.db", env = "DATABASE_PATH")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables and indexes
    Init {
        /// Also insert the demo users, posts and follow edges
        #[arg(long)]
        seed_demo_data: bool,
    },
    /// Print the number of rows in every table
    Check,
    /// Delete a user and everything they own
    DeleteUser {
        /// Local user id
        #[arg(long)]
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Delete a post with its likes, comments and shares
    DeletePost {
        /// Post id
        #[arg(long)]
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Row counts before and after a delete, per table
#[derive(Debug, PartialEq)]
struct CascadeReport {
    rows: Vec<(&'static str, i64, i64)>,
}

impl CascadeReport {
    fn removed(&self, table: &str) -> i64 {
        self.rows
            .iter()
            .find(|(t, _, _)| *t == table)
            .map(|(_, before, after)| before - after)
            .unwrap_or(0)
    }

    fn print(&self) {
        println!("Rows removed:");
        for (table, before, after) in &self.rows {
            if before != after {
                println!("  {:<14} {}", table, before - after);
            }
        }
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read confirmation")?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Run a delete and diff the table counts around it
fn with_cascade_report(db: &Database, delete: impl FnOnce() -> Result<usize>) -> Result<CascadeReport> {
    let before = db.table_counts()?;
    if delete()? == 0 {
        bail!("Nothing was deleted");
    }
    let after = db.table_counts()?;

    Ok(CascadeReport {
        rows: before
            .into_iter()
            .zip(after)
            .map(|((table, b), (_, a))| (table, b, a))
            .collect(),
    })
}

fn delete_user(db: &Database, user_id: i64) -> Result<CascadeReport> {
    let repo = UserRepository::new(db.pool.clone());
    if !repo.exists(user_id)? {
        bail!("User {} not found", user_id);
    }
    with_cascade_report(db, || repo.delete(user_id))
}

fn delete_post(db: &Database, post_id: i64) -> Result<CascadeReport> {
    let repo = PostRepository::new(db.pool.clone());
    if repo.get_by_id(post_id)?.is_none() {
        bail!("Post {} not found", post_id);
    }
    with_cascade_report(db, || repo.delete(post_id))
}

fn print_counts(db: &Database) -> Result<()> {
    println!("Table          Rows");
    println!("-----          ----");
    for (table, count) in db.table_counts()? {
        println!("{:<14} {}", table, count);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Murmur Admin");
    println!("============");
    println!("Database: {}", args.database);
    println!();

    let db = Database::new(&args.database)
        .with_context(|| format!("Failed to open database at {}", args.database))?;

    match args.command {
        Command::Init { seed_demo_data } => {
            db.initialize()?;
            println!("Schema is up to date");
            if seed_demo_data {
                db.seed_demo_data()?;
                println!("Demo data inserted");
            }
        }
        Command::Check => {
            db.initialize()?;
            print_counts(&db)?;
        }
        Command::DeleteUser { id, yes } => {
            if !yes && !confirm(&format!("Delete user {} and all of their content?", id))? {
                println!("Cancelled.");
                return Ok(());
            }
            let report = delete_user(&db, id)?;
            report.print();
            println!("User {} deleted", id);
        }
        Command::DeletePost { id, yes } => {
            if !yes && !confirm(&format!("Delete post {}?", id))? {
                println!("Cancelled.");
                return Ok(());
            }
            let report = delete_post(&db, id)?;
            report.print();
            println!("Post {} deleted", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn demo_db() -> Database {
        let db = Database::in_memory().expect("Failed to create database");
        db.seed_demo_data().expect("Failed to seed demo data");
        db
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();

        let args = Args::parse_from(["murmur-admin", "delete-user", "--id", "3", "-y"]);
        assert!(matches!(args.command, Command::DeleteUser { id: 3, yes: true }));
    }

    #[test]
    fn test_delete_user_reports_cascade() {
        let db = demo_db();
        // Demo user 1 (alice) owns posts 1 and 4, liked post 2 and follows user 2
        let report = delete_user(&db, 1).unwrap();

        assert_eq!(report.removed("users"), 1);
        assert_eq!(report.removed("posts"), 2);
        assert_eq!(report.removed("likes"), 3);
        assert_eq!(report.removed("comments"), 2);
        assert_eq!(report.removed("comment_likes"), 1);
        assert_eq!(report.removed("followers"), 3);
        assert_eq!(report.removed("shares"), 0);
    }

    #[test]
    fn test_delete_post_reports_cascade() {
        let db = demo_db();
        let report = delete_post(&db, 2).unwrap();

        assert_eq!(report.removed("posts"), 1);
        assert_eq!(report.removed("likes"), 1);
        assert_eq!(report.removed("shares"), 1);
        assert_eq!(report.removed("users"), 0);
    }

    #[test]
    fn test_delete_missing_rows_fails() {
        let db = demo_db();
        assert!(delete_user(&db, 42).is_err());
        assert!(delete_post(&db, 42).is_err());
    }
}
