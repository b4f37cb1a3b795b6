//! Employees, reporting edges and the leave-type catalog.
//!
//! These rows belong to the profile subsystem. The write methods exist so the
//! store can be populated; the core itself only reads them.

use rusqlite::{OptionalExtension, Row, params};

use crate::error::HrResult;
use crate::models::{Employee, LeaveType, ReportType, ReportingEdge};

use super::{Tx, parse_column};

fn map_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        emp_id: row.get(0)?,
        name: row.get(1)?,
        role: parse_column(row, 2)?,
        active: row.get(3)?,
        device_user_id: row.get(4)?,
    })
}

fn map_edge(row: &Row<'_>) -> rusqlite::Result<ReportingEdge> {
    Ok(ReportingEdge {
        emp_id: row.get(0)?,
        reports_to: row.get(1)?,
        report_type: parse_column(row, 2)?,
    })
}

impl Tx<'_> {
    /// Inserts or replaces an employee.
    pub fn upsert_employee(&self, employee: &Employee) -> HrResult<()> {
        self.conn().execute(
            "INSERT INTO employees (emp_id, name, role, active, device_user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (emp_id) DO UPDATE SET
               name = excluded.name,
               role = excluded.role,
               active = excluded.active,
               device_user_id = excluded.device_user_id",
            params![
                employee.emp_id,
                employee.name,
                employee.role.as_str(),
                employee.active,
                employee.device_user_id
            ],
        )?;
        Ok(())
    }

    /// Looks up an employee by business key.
    pub fn employee(&self, emp_id: &str) -> HrResult<Option<Employee>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT emp_id, name, role, active, device_user_id
                 FROM employees WHERE emp_id = ?1",
                params![emp_id],
                map_employee,
            )
            .optional()?)
    }

    /// All active employees, ordered by business key.
    pub fn active_employees(&self) -> HrResult<Vec<Employee>> {
        let mut stmt = self.conn().prepare(
            "SELECT emp_id, name, role, active, device_user_id
             FROM employees WHERE active = 1 ORDER BY emp_id",
        )?;
        let rows = stmt.query_map([], map_employee)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Exact-match lookup from a device user identifier to an employee.
    pub fn emp_id_for_device_user(&self, device_user_id: &str) -> HrResult<Option<String>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT emp_id FROM employees WHERE device_user_id = ?1",
                params![device_user_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    /// Records a reporting edge. Re-inserting an identical edge is a no-op.
    pub fn insert_reporting_edge(&self, edge: &ReportingEdge) -> HrResult<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO reporting_edges (emp_id, reports_to, report_type)
             VALUES (?1, ?2, ?3)",
            params![edge.emp_id, edge.reports_to, edge.report_type.as_str()],
        )?;
        Ok(())
    }

    /// The supervisor `emp_id` escalates to along `report_type` edges.
    ///
    /// The earliest recorded edge wins; `None` means the top of the chain.
    pub fn supervisor_edge(
        &self,
        emp_id: &str,
        report_type: ReportType,
    ) -> HrResult<Option<String>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT reports_to FROM reporting_edges
                 WHERE emp_id = ?1 AND report_type = ?2
                 ORDER BY id LIMIT 1",
                params![emp_id, report_type.as_str()],
                |r| r.get(0),
            )
            .optional()?)
    }

    /// Every reporting edge in insertion order.
    pub fn reporting_edges(&self) -> HrResult<Vec<ReportingEdge>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT emp_id, reports_to, report_type FROM reporting_edges ORDER BY id")?;
        let rows = stmt.query_map([], map_edge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inserts or replaces a leave type.
    pub fn upsert_leave_type(&self, leave_type: &LeaveType) -> HrResult<()> {
        self.conn().execute(
            "INSERT INTO leave_types (name, active) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET active = excluded.active",
            params![leave_type.name, leave_type.active],
        )?;
        Ok(())
    }

    /// Looks up a leave type by name.
    pub fn leave_type(&self, name: &str) -> HrResult<Option<LeaveType>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT name, active FROM leave_types WHERE name = ?1",
                params![name],
                |r| {
                    Ok(LeaveType {
                        name: r.get(0)?,
                        active: r.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    /// The full leave-type catalog.
    pub fn leave_types(&self) -> HrResult<Vec<LeaveType>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name, active FROM leave_types ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok(LeaveType {
                name: r.get(0)?,
                active: r.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Employee, ReportType, ReportingEdge, Role};
    use crate::store::Store;

    fn employee(emp_id: &str, device_user_id: Option<&str>, active: bool) -> Employee {
        Employee {
            emp_id: emp_id.to_string(),
            name: format!("Employee {}", emp_id),
            role: Role::Employee,
            active,
            device_user_id: device_user_id.map(str::to_string),
        }
    }

    #[test]
    fn test_upsert_employee_replaces_fields() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.upsert_employee(&employee("EMP001", Some("17"), true))?;
                tx.upsert_employee(&employee("EMP001", Some("18"), false))
            })
            .unwrap();

        let found = store.read(|tx| tx.employee("EMP001")).unwrap().unwrap();
        assert!(!found.active);
        assert_eq!(found.device_user_id.as_deref(), Some("18"));
    }

    #[test]
    fn test_active_employees_excludes_inactive() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.upsert_employee(&employee("EMP002", None, true))?;
                tx.upsert_employee(&employee("EMP001", None, true))?;
                tx.upsert_employee(&employee("EMP003", None, false))
            })
            .unwrap();

        let active = store.read(|tx| tx.active_employees()).unwrap();
        let ids: Vec<_> = active.iter().map(|e| e.emp_id.as_str()).collect();
        assert_eq!(ids, vec!["EMP001", "EMP002"]);
    }

    #[test]
    fn test_device_user_lookup_is_exact() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| tx.upsert_employee(&employee("EMP001", Some("17"), true)))
            .unwrap();

        let hit = store.read(|tx| tx.emp_id_for_device_user("17")).unwrap();
        let miss = store.read(|tx| tx.emp_id_for_device_user("170")).unwrap();
        assert_eq!(hit.as_deref(), Some("EMP001"));
        assert_eq!(miss, None);
    }

    #[test]
    fn test_reporting_edges_keep_insertion_order() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.insert_reporting_edge(&ReportingEdge {
                    emp_id: "EMP001".into(),
                    reports_to: "MGR002".into(),
                    report_type: ReportType::Dotted,
                })?;
                tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR001"))?;
                tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR001"))
            })
            .unwrap();

        let edges = store.read(|tx| tx.reporting_edges()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].report_type, ReportType::Dotted);
        assert_eq!(edges[1].reports_to, "MGR001");
    }

    #[test]
    fn test_supervisor_edge_takes_earliest_of_requested_type() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|tx| {
                tx.insert_reporting_edge(&ReportingEdge {
                    emp_id: "EMP001".into(),
                    reports_to: "LEAD001".into(),
                    report_type: ReportType::Dotted,
                })?;
                tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR001"))?;
                tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR002"))?;
                tx.insert_reporting_edge(&ReportingEdge::primary("MGR001", "DIR001"))
            })
            .unwrap();

        let primary = store
            .read(|tx| tx.supervisor_edge("EMP001", ReportType::Primary))
            .unwrap();
        let dotted = store
            .read(|tx| tx.supervisor_edge("EMP001", ReportType::Dotted))
            .unwrap();
        let secondary = store
            .read(|tx| tx.supervisor_edge("EMP001", ReportType::Secondary))
            .unwrap();
        let top = store
            .read(|tx| tx.supervisor_edge("DIR001", ReportType::Primary))
            .unwrap();
        assert_eq!(primary.as_deref(), Some("MGR001"));
        assert_eq!(dotted.as_deref(), Some("LEAD001"));
        assert_eq!(secondary, None);
        assert_eq!(top, None);
    }
}
