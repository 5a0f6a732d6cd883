pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    contents TEXT NOT NULL DEFAULT '',
    date INTEGER NOT NULL,
    category TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(date, id);
CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
";
