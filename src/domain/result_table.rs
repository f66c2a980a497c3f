use serde::Serialize;

use super::townhouse::TownhouseRecord;

pub const CSV_FILE_NAME: &str = "townhouse_info.csv";
pub const CSV_COLUMNS: [&str; 5] = [
    "complex_name",
    "strata_number",
    "unit_count",
    "level_count",
    "source",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub complex_name: String,
    pub strata_number: String,
    pub unit_count: String,
    pub level_count: String,
    pub source: String,
}

impl From<&TownhouseRecord> for TableRow {
    fn from(value: &TownhouseRecord) -> Self {
        Self {
            complex_name: value.complex_name.clone().unwrap_or_default(),
            strata_number: value.strata_number.clone().unwrap_or_default(),
            unit_count: value.unit_count.clone().unwrap_or_default(),
            level_count: value.level_count.clone().unwrap_or_default(),
            source: value.source.clone().unwrap_or_default(),
        }
    }
}

/// Records in the order their pages were visited. Two rows describing the
/// same complex stay two rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TownhouseRecord>) -> Self {
        Self {
            rows: records.into_iter().map(TableRow::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(CSV_COLUMNS)?;
        for row in self.rows.iter() {
            writer.write_record([
                &row.complex_name,
                &row.strata_number,
                &row.unit_count,
                &row.level_count,
                &row.source,
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::ResultTable;
    use crate::domain::townhouse::TownhouseRecord;

    #[test]
    fn empty_table_still_has_header() {
        let csv = ResultTable::default().to_csv().unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "complex_name,strata_number,unit_count,level_count,source\n"
        );
    }

    #[test]
    fn writes_rows_in_record_order_with_blank_cells() {
        let records = vec![
            TownhouseRecord {
                complex_name: Some("Harbour Mews".to_string()),
                strata_number: Some("VR 1234".to_string()),
                unit_count: Some("42".to_string()),
                level_count: None,
                source: Some("https://a.example/1".to_string()),
            },
            TownhouseRecord {
                complex_name: Some("Mews, The".to_string()),
                strata_number: None,
                unit_count: None,
                level_count: Some("3".to_string()),
                source: Some("https://b.example/2".to_string()),
            },
        ];

        let table = ResultTable::from_records(records.iter());
        assert_eq!(table.len(), 2);

        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "complex_name,strata_number,unit_count,level_count,source",
                "Harbour Mews,VR 1234,42,,https://a.example/1",
                "\"Mews, The\",,,3,https://b.example/2",
            ]
        );
    }

    #[test]
    fn duplicate_complexes_are_not_merged() {
        let record = TownhouseRecord {
            complex_name: Some("Cedar Row".to_string()),
            ..Default::default()
        };
        let table = ResultTable::from_records([&record, &record]);
        assert_eq!(table.len(), 2);
    }
}
