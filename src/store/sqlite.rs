use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use super::{PlatformStore, ProposalMutation};
use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::{
    Comment, Proposal, ProposalFilter, ProposalStatus, Vote, VoteDecision,
};
use crate::models::user::{User, UserRole};

pub const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
        log::info!("Applied database migration 1");
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
        log::info!("Applied database migration 2");
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!(
            "Database schema version {version} is newer than supported version {DB_SCHEMA_VERSION}"
        );
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin', 'organizer', 'investor', 'officer')),
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS proposals (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('DRAFT', 'SUBMITTED', 'IN_REVIEW', 'VETTED', 'CALLBACK', 'FUNDED', 'REJECTED')) DEFAULT 'DRAFT',
            organizer_id TEXT NOT NULL,
            organizer_name TEXT NOT NULL,
            organizer_email TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS votes (
            proposal_id TEXT NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
            officer_id TEXT NOT NULL,
            officer_name TEXT NOT NULL,
            decision TEXT NOT NULL CHECK(decision IN ('ACCEPT', 'REJECT')),
            review TEXT NOT NULL DEFAULT '',
            timestamp INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (proposal_id, officer_id)
        );

        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            proposal_id TEXT NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            is_internal INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
        CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status);
        CREATE INDEX IF NOT EXISTS idx_proposals_organizer ON proposals(organizer_id);
        CREATE INDEX IF NOT EXISTS idx_votes_position ON votes(proposal_id, position);
        CREATE INDEX IF NOT EXISTS idx_comments_position ON comments(proposal_id, position);
        ",
    )
}

pub fn get_db_connection(data_dir: &str) -> Result<Connection> {
    let db_path = Path::new(data_dir).join(".fundvote").join("state.db");
    let conn = Connection::open(db_path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// SQLite-backed `PlatformStore`. Votes and comments live in child tables
/// keyed by proposal, with an explicit `position` column to keep list order.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> PlatformResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(data_dir: &str) -> PlatformResult<Self> {
        let dir = Path::new(data_dir).join(".fundvote");
        std::fs::create_dir_all(&dir).map_err(|e| {
            PlatformError::Storage(format!("Failed to create {}: {e}", dir.display()))
        })?;
        let conn = get_db_connection(data_dir)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> PlatformResult<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> PlatformResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PlatformError::Storage("Database lock poisoned".to_string()))
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    let role_raw: String = row.get(3)?;
    let role = UserRole::parse(&role_raw)
        .ok_or_else(|| conversion_error(3, format!("unknown role '{role_raw}'")))?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at, updated_at";

fn load_proposal(conn: &Connection, id: &str) -> Result<Option<Proposal>> {
    let proposal = conn
        .query_row(
            "SELECT id, title, description, amount, status, organizer_id, organizer_name, organizer_email, created_at, updated_at FROM proposals WHERE id = ?1",
            params![id],
            |row| {
                let status_raw: String = row.get(4)?;
                let status = ProposalStatus::parse(&status_raw)
                    .ok_or_else(|| conversion_error(4, format!("unknown status '{status_raw}'")))?;
                Ok(Proposal {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    status,
                    organizer_id: row.get(5)?,
                    organizer_name: row.get(6)?,
                    organizer_email: row.get(7)?,
                    votes: Vec::new(),
                    comments: Vec::new(),
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )
        .optional()?;

    let Some(mut proposal) = proposal else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT officer_id, officer_name, decision, review, timestamp FROM votes WHERE proposal_id = ?1 ORDER BY position ASC",
    )?;
    proposal.votes = stmt
        .query_map(params![id], |row| {
            let decision_raw: String = row.get(2)?;
            let decision = VoteDecision::parse(&decision_raw)
                .ok_or_else(|| conversion_error(2, format!("unknown decision '{decision_raw}'")))?;
            Ok(Vote {
                officer_id: row.get(0)?,
                officer_name: row.get(1)?,
                decision,
                review: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, author, content, created_at, is_internal FROM comments WHERE proposal_id = ?1 ORDER BY position ASC",
    )?;
    proposal.comments = stmt
        .query_map(params![id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                author: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
                is_internal: row.get::<_, i32>(4)? != 0,
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(proposal))
}

fn write_children(conn: &Connection, proposal: &Proposal) -> Result<()> {
    conn.execute("DELETE FROM votes WHERE proposal_id = ?1", params![&proposal.id])?;
    for (position, vote) in proposal.votes.iter().enumerate() {
        conn.execute(
            "INSERT INTO votes (proposal_id, officer_id, officer_name, decision, review, timestamp, position) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                &proposal.id,
                &vote.officer_id,
                &vote.officer_name,
                vote.decision.as_str(),
                &vote.review,
                vote.timestamp,
                position as i64,
            ],
        )?;
    }

    conn.execute("DELETE FROM comments WHERE proposal_id = ?1", params![&proposal.id])?;
    for (position, comment) in proposal.comments.iter().enumerate() {
        conn.execute(
            "INSERT INTO comments (id, proposal_id, author, content, created_at, is_internal, position) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                &comment.id,
                &proposal.id,
                &comment.author,
                &comment.content,
                comment.created_at,
                comment.is_internal as i32,
                position as i64,
            ],
        )?;
    }

    Ok(())
}

impl PlatformStore for SqliteStore {
    fn get_user(&self, id: &str) -> PlatformResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> PlatformResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn insert_user(&self, user: &User) -> PlatformResult<()> {
        let conn = self.lock()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE)",
            params![&user.email],
            |r| r.get(0),
        )?;
        if taken {
            return Err(PlatformError::Conflict("Email already registered".to_string()));
        }

        conn.execute(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                &user.id,
                &user.email,
                &user.name,
                user.role.as_str(),
                &user.password_hash,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    fn list_users(&self, role: Option<UserRole>) -> PlatformResult<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE (?1 IS NULL OR role = ?1) ORDER BY created_at ASC, id ASC"
        ))?;
        let users = stmt
            .query_map(params![role.map(|r| r.as_str())], user_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(users)
    }

    fn get_proposal(&self, id: &str) -> PlatformResult<Option<Proposal>> {
        let conn = self.lock()?;
        Ok(load_proposal(&conn, id)?)
    }

    fn insert_proposal(&self, proposal: &Proposal) -> PlatformResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO proposals (id, title, description, amount, status, organizer_id, organizer_name, organizer_email, created_at, updated_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                &proposal.id,
                &proposal.title,
                &proposal.description,
                proposal.amount,
                proposal.status.as_str(),
                &proposal.organizer_id,
                &proposal.organizer_name,
                &proposal.organizer_email,
                proposal.created_at,
                proposal.updated_at,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                PlatformError::Conflict(format!("Proposal {} already exists", proposal.id))
            }
            other => PlatformError::from(other),
        })?;
        write_children(&tx, proposal)?;
        tx.commit()?;
        Ok(())
    }

    fn list_proposals(&self, filter: &ProposalFilter) -> PlatformResult<Vec<Proposal>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM proposals WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR organizer_id = ?2) ORDER BY created_at DESC, id ASC",
        )?;
        let ids = stmt
            .query_map(
                params![
                    filter.status.map(|s| s.as_str()),
                    filter.organizer_id.as_deref(),
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>>>()?;

        let mut proposals = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(proposal) = load_proposal(&conn, &id)? {
                proposals.push(proposal);
            }
        }
        Ok(proposals)
    }

    fn update_proposal(&self, id: &str, apply: ProposalMutation<'_>) -> PlatformResult<Proposal> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut proposal =
            load_proposal(&tx, id)?.ok_or_else(PlatformError::proposal_not_found)?;

        // Dropping `tx` on the error path rolls back.
        apply(&mut proposal)?;

        tx.execute(
            "UPDATE proposals SET title=?2, description=?3, amount=?4, status=?5, updated_at=?6 WHERE id=?1",
            params![
                &proposal.id,
                &proposal.title,
                &proposal.description,
                proposal.amount,
                proposal.status.as_str(),
                proposal.updated_at,
            ],
        )?;
        write_children(&tx, &proposal)?;
        tx.commit()?;
        Ok(proposal)
    }
}
