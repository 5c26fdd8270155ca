use serde::Serialize;
use std::fmt;
use tracing::info;

use super::StoreSet;
use crate::models::{StoreKind, Value};
use crate::Result;

/// Enumeration of one store
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub store: StoreKind,
    pub label: String,
    pub values: Vec<Value>,
}

/// Renders as `"<label>: v1, v2, \n"`; every value is followed by `", "`.
impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.label)?;
        for value in &self.values {
            write!(f, "{}, ", value)?;
        }
        writeln!(f)
    }
}

/// One line per store, in fan-out order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub lines: Vec<ReportLine>,
}

impl Report {
    pub fn line(&self, store: StoreKind) -> Option<&ReportLine> {
        self.lines.iter().find(|line| line.store == store)
    }

    pub fn values(&self, store: StoreKind) -> &[Value] {
        self.line(store)
            .map(|line| line.values.as_slice())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Enumerates every store without mutating it
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, stores: &StoreSet) -> Report {
        let lines = stores
            .stores()
            .iter()
            .map(|store| {
                let line = ReportLine {
                    store: store.kind(),
                    label: store.kind().label().to_string(),
                    values: store.enumerate(),
                };
                info!("{}", line.to_string().trim_end());
                line
            })
            .collect();
        Report { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSettings;
    use crate::pipeline::IngestionPipeline;

    fn report_for(values: &[Value], settings: StoreSettings) -> Report {
        let mut set = StoreSet::new(settings).unwrap();
        IngestionPipeline::new()
            .ingest_values(&mut set, values)
            .unwrap();
        ReportGenerator::new().generate(&set)
    }

    #[test]
    fn test_line_format() {
        let line = ReportLine {
            store: StoreKind::Sequence,
            label: "Linked list".to_string(),
            values: vec![5, 3],
        };
        assert_eq!(line.to_string(), "Linked list: 5, 3, \n");

        let empty = ReportLine {
            store: StoreKind::Paged,
            label: "XArray".to_string(),
            values: vec![],
        };
        assert_eq!(empty.to_string(), "XArray: \n");
    }

    #[test]
    fn test_full_report() {
        let report = report_for(&[1, 2, 3], StoreSettings::default().with_bucket_count(2));
        let expected = "Linked list: 1, 2, 3, \n\
                        Hash table: 2, 1, 3, \n\
                        Red-black tree: 1, 2, 3, \n\
                        Radix tree: 1, 2, 3, \n\
                        XArray: 1, 2, 3, \n";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_empty_input_gives_five_empty_lines() {
        let report = report_for(&[], StoreSettings::default());
        assert_eq!(report.lines.len(), 5);
        assert!(report.lines.iter().all(|line| line.values.is_empty()));
    }

    #[test]
    fn test_report_does_not_consume_stores() {
        let mut set = StoreSet::new(StoreSettings::default()).unwrap();
        IngestionPipeline::new()
            .ingest_values(&mut set, &[4, 1])
            .unwrap();

        let generator = ReportGenerator::new();
        assert_eq!(generator.generate(&set), generator.generate(&set));
        assert_eq!(set.total_len(), 10);
    }

    #[test]
    fn test_json_output() {
        let report = report_for(&[7], StoreSettings::default());
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["lines"][2]["store"], "tree");
        assert_eq!(json["lines"][2]["values"][0], 7);
        assert_eq!(report.values(StoreKind::Radix), &[7]);
    }
}
