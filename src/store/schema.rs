//! Table definitions, applied idempotently on open.

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
  emp_id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  role TEXT NOT NULL,
  active INTEGER NOT NULL,
  device_user_id TEXT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS reporting_edges (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  emp_id TEXT NOT NULL,
  reports_to TEXT NOT NULL,
  report_type TEXT NOT NULL,
  UNIQUE (emp_id, reports_to, report_type)
);
CREATE INDEX IF NOT EXISTS idx_reporting_edges_supervisor
  ON reporting_edges (emp_id, report_type, id);

CREATE TABLE IF NOT EXISTS leave_types (
  name TEXT PRIMARY KEY,
  active INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS leave_balances (
  emp_id TEXT NOT NULL,
  leave_type TEXT NOT NULL,
  year INTEGER NOT NULL,
  total TEXT NOT NULL,
  used TEXT NOT NULL,
  remaining TEXT NOT NULL,
  PRIMARY KEY (emp_id, leave_type, year)
);

CREATE TABLE IF NOT EXISTS leave_requests (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  emp_id TEXT NOT NULL,
  leave_type TEXT NOT NULL,
  start_date TEXT NOT NULL,
  end_date TEXT NOT NULL,
  day_count TEXT NOT NULL,
  reason TEXT NULL,
  status TEXT NOT NULL,
  balance_year INTEGER NOT NULL,
  submitted_at_ms INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_leave_requests_emp
  ON leave_requests (emp_id, submitted_at_ms);

CREATE TABLE IF NOT EXISTS leave_approvals (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  leave_request_id INTEGER NOT NULL REFERENCES leave_requests (id),
  approver_emp_id TEXT NOT NULL,
  approver_role_label TEXT NOT NULL,
  level INTEGER NOT NULL,
  status TEXT NOT NULL,
  remarks TEXT NULL,
  decided_at_ms INTEGER NULL,
  created_at_ms INTEGER NOT NULL,
  UNIQUE (leave_request_id, level)
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_leave_approvals_one_pending
  ON leave_approvals (leave_request_id) WHERE status = 'pending';
CREATE INDEX IF NOT EXISTS idx_leave_approvals_approver
  ON leave_approvals (approver_emp_id, status);

CREATE TABLE IF NOT EXISTS punch_events (
  emp_id TEXT NOT NULL,
  instant_secs INTEGER NOT NULL,
  device_id TEXT NOT NULL,
  PRIMARY KEY (emp_id, instant_secs)
);

CREATE TABLE IF NOT EXISTS daily_attendance (
  emp_id TEXT NOT NULL,
  date TEXT NOT NULL,
  punch_in TEXT NULL,
  punch_out TEXT NULL,
  total_minutes INTEGER NOT NULL,
  status TEXT NOT NULL,
  PRIMARY KEY (emp_id, date)
);
"#;
