use super::{PersistenceError, PersistenceResult, ProjectRecord, ProjectStore};
use crate::dependency::Dependency;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::task::Task;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS project_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tasks (
                seq INTEGER PRIMARY KEY,
                id INTEGER NOT NULL UNIQUE,
                task_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS dependencies (
                seq INTEGER PRIMARY KEY,
                predecessor INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                successor INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                dependency_json TEXT NOT NULL,
                UNIQUE (predecessor, successor)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_metadata(
        &self,
        tx: &rusqlite::Transaction,
        metadata: &ProjectMetadata,
    ) -> PersistenceResult<()> {
        let json = serde_json::to_string(metadata)?;
        tx.execute("DELETE FROM project_metadata", [])?;
        tx.execute(
            "INSERT INTO project_metadata (id, metadata_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_graph(&self, tx: &rusqlite::Transaction, record: &ProjectRecord) -> PersistenceResult<()> {
        tx.execute("DELETE FROM dependencies", [])?;
        tx.execute("DELETE FROM tasks", [])?;

        // Row order preserves insertion order, which drives tie-breaking.
        let mut stmt = tx.prepare("INSERT INTO tasks (seq, id, task_json) VALUES (?1, ?2, ?3)")?;
        for (seq, task) in record.tasks.iter().enumerate() {
            let json = serde_json::to_string(task)?;
            stmt.execute(params![seq as i64, task.id, json])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO dependencies (seq, predecessor, successor, dependency_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (seq, dep) in record.dependencies.iter().enumerate() {
            let json = serde_json::to_string(dep)?;
            stmt.execute(params![seq as i64, dep.predecessor, dep.successor, json])?;
        }
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()> {
        let record = ProjectRecord::from_project(project);
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        self.save_metadata(&tx, &record.metadata)?;
        self.save_graph(&tx, &record)?;
        tx.commit()?;
        Ok(())
    }

    fn load_project(&self) -> PersistenceResult<Option<Project>> {
        let conn = self.connection.lock();

        let mut stmt = conn.prepare("SELECT metadata_json FROM project_metadata WHERE id = 1")?;
        let metadata_json_opt: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        let Some(metadata_json) = metadata_json_opt else {
            return Ok(None);
        };
        let metadata: ProjectMetadata = serde_json::from_str(&metadata_json)?;

        let mut stmt = conn.prepare("SELECT task_json FROM tasks ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tasks = Vec::new();
        for json in rows {
            let task: Task = serde_json::from_str(&json?)?;
            tasks.push(task);
        }

        let mut stmt = conn.prepare("SELECT dependency_json FROM dependencies ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut dependencies = Vec::new();
        for json in rows {
            let dep: Dependency = serde_json::from_str(&json?)?;
            dependencies.push(dep);
        }

        if tasks.is_empty() && !dependencies.is_empty() {
            return Err(PersistenceError::InvalidData(
                "dependencies stored without tasks".into(),
            ));
        }

        ProjectRecord {
            metadata,
            tasks,
            dependencies,
        }
        .into_project()
        .map(Some)
    }
}
