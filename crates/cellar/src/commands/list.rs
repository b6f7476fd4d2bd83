//! List command - stored sessions at a glance.

use anyhow::Result;
use cellar_session::SessionStore;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use tracing::debug;

use super::{Context, format_timestamp};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum sessions to show
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct SessionRow {
    id: String,
    created_at: Option<i64>,
    max_age: Option<i64>,
    expires_at: Option<i64>,
    expired: bool,
    corrupt: bool,
}

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let now = store.now();
    let ids = store.ids()?;

    let rows: Vec<SessionRow> = ids
        .iter()
        .take(args.limit)
        .filter_map(|id| session_row(&store, id, now))
        .collect();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Sessions").bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    if rows.is_empty() {
        println!("{}", dim.apply_to("No sessions stored"));
        return Ok(());
    }

    for row in &rows {
        let status = if row.corrupt {
            style("corrupt").red()
        } else if row.expired {
            style("expired").yellow()
        } else {
            style("active").green()
        };
        let created = row
            .created_at
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", row.id, dim.apply_to(created), status);
    }

    if ids.len() > args.limit {
        println!();
        println!(
            "{}",
            dim.apply_to(format!("... and {} more", ids.len() - args.limit))
        );
    }
    if ctx.verbose {
        println!("{}", dim.apply_to(format!("{} total", ids.len())));
    }
    Ok(())
}

/// Summarize one stored session. `None` if it was removed since the ids
/// were read.
fn session_row(store: &SessionStore, id: &str, now: i64) -> Option<SessionRow> {
    match store.inspect(id) {
        Ok(Some((record, _))) => Some(SessionRow {
            id: id.to_string(),
            created_at: Some(record.created_at),
            max_age: Some(record.max_age),
            expires_at: record.expires_at(),
            expired: record.is_expired(now),
            corrupt: false,
        }),
        Ok(None) => None,
        Err(e) => {
            debug!(id, error = %e, "Unreadable session record");
            Some(SessionRow {
                id: id.to_string(),
                created_at: None,
                max_age: None,
                expires_at: None,
                expired: false,
                corrupt: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_session::{Config, KeyPair, MemoryTransport, Session};
    use cellar_store::{Bucket, Database};

    fn store() -> SessionStore {
        let db = Database::open_in_memory().unwrap();
        SessionStore::new(&db, Config::new(), &[KeyPair::new(b"secret".to_vec())]).unwrap()
    }

    #[test]
    fn test_row_for_stored_session() {
        let store = store();
        let mut transport = MemoryTransport::new().with_max_age(60);
        let mut session = Session::new("test");
        store.save(&mut transport, &mut session).unwrap();

        let now = store.now();
        let row = session_row(&store, session.id(), now).unwrap();
        assert!(!row.corrupt);
        assert_eq!(row.max_age, Some(60));
        assert!(!row.expired);
        assert!(session_row(&store, session.id(), now + 60).unwrap().expired);
    }

    #[test]
    fn test_vanished_session_skipped() {
        let store = store();
        assert!(session_row(&store, "gone", store.now()).is_none());
    }

    #[test]
    fn test_unreadable_session_flagged() {
        let store = store();
        store.bucket().put(b"broken", b"not a record").unwrap();

        let row = session_row(&store, "broken", store.now()).unwrap();
        assert!(row.corrupt);
        assert_eq!(row.created_at, None);
    }
}
