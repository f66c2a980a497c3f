use std::{collections::HashMap, sync::Mutex};

use uuid::Uuid;

use crate::domain::result_table::ResultTable;

const SET_RESET_LEN: usize = 1_000;

/// Result tables of recent runs, kept in memory so the results page can
/// offer its CSV. Nothing survives a restart.
#[derive(Default)]
pub struct ReportStore {
    tables: Mutex<HashMap<Uuid, ResultTable>>,
}

impl ReportStore {
    pub fn insert(&self, table: ResultTable) -> Uuid {
        let id = Uuid::new_v4();
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if tables.len() >= SET_RESET_LEN {
            log::info!("Report store reached {} tables, clearing", tables.len());
            tables.clear();
        }
        tables.insert(id, table);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<ResultTable> {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }
}
