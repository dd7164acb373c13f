//! Tab-separated statistics report.
//!
//! ```text
//! Alignment  Theta  Pi  TajimasD  nseff  [PiN  PiS  [MK_<O>  NI_<O>]...]
//! ```
//!
//! The bracketed columns are only present in frame mode. Missing values are
//! written as `NA` so that every row has as many fields as the header.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::{AlignmentStats, StatResult};

/// Default report file name, written in the working directory.
pub const DEFAULT_REPORT_NAME: &str = "selectionStats.txt";

/// Placeholder for a value that could not be computed.
pub const MISSING_VALUE: &str = "NA";

/// Errors that can occur while writing the report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
}

/// Results of a run, keyed by alignment name in insertion order.
#[derive(Debug, Clone)]
pub struct ReportTable {
    frame: bool,
    outgroups: Vec<String>,
    rows: Vec<(String, StatResult)>,
}

impl ReportTable {
    /// Creates an empty table with the column layout of a run.
    pub fn new(frame: bool, outgroups: Vec<String>) -> Self {
        Self {
            frame,
            outgroups,
            rows: Vec::new(),
        }
    }

    /// Adds the result of an alignment. A name seen before keeps its
    /// position and gets the new result.
    pub fn insert(&mut self, name: impl Into<String>, result: StatResult) {
        let name = name.into();
        match self.rows.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = result,
            None => self.rows.push((name, result)),
        }
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> Option<&StatResult> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Number of alignments, rejected ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatResult)> {
        self.rows.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Names of alignments rejected for being out of frame.
    pub fn rejected(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, r)| matches!(r, StatResult::OutOfFrame))
            .map(|(n, _)| n)
    }

    /// Column names.
    pub fn header(&self) -> Vec<String> {
        let mut columns: Vec<String> = ["Alignment", "Theta", "Pi", "TajimasD", "nseff"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        if self.frame {
            columns.push("PiN".to_string());
            columns.push("PiS".to_string());
            for outgroup in &self.outgroups {
                columns.push(format!("MK_{}", outgroup));
                columns.push(format!("NI_{}", outgroup));
            }
        }
        columns
    }

    /// Fields of one accepted alignment, in header order.
    fn fields(&self, name: &str, stats: &AlignmentStats) -> Vec<String> {
        let mut fields = vec![
            name.to_string(),
            format_value(stats.theta),
            format_value(stats.pi),
            format_value(stats.tajima_d),
            format_value(stats.nseff),
        ];
        if self.frame {
            let coding = stats.coding.as_ref();
            fields.push(format_value(coding.and_then(|c| c.pi_n)));
            fields.push(format_value(coding.and_then(|c| c.pi_s)));
            for outgroup in &self.outgroups {
                match stats.outgroup_test(outgroup) {
                    Some(test) => {
                        fields.push(test.table.to_string());
                        fields.push(format_value(test.neutrality_index));
                    }
                    None => {
                        fields.push(MISSING_VALUE.to_string());
                        fields.push(MISSING_VALUE.to_string());
                    }
                }
            }
        }
        fields
    }

    /// Writes the header and one line per accepted alignment.
    ///
    /// Returns the number of data rows written.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<usize> {
        writeln!(writer, "{}", self.header().join("\t"))?;
        let mut written = 0;
        for (name, result) in self.iter() {
            if let Some(stats) = result.stats() {
                writeln!(writer, "{}", self.fields(name, stats).join("\t"))?;
                written += 1;
            }
        }
        writer.flush()?;
        Ok(written)
    }

    /// Writes the report to `path`, replacing any existing file.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, ReportError> {
        let path = path.as_ref();
        let to_error = |source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        self.write_to(BufWriter::new(file)).map_err(to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CodingStats, OutgroupTest};
    use crate::stats::MkTable;
    use tempfile::tempdir;

    fn stats(outgroups: &[&str]) -> StatResult {
        StatResult::Computed(AlignmentStats {
            theta: Some(0.25),
            pi: Some(0.5),
            tajima_d: None,
            nseff: Some(4.0),
            coding: Some(CodingStats {
                pi_n: Some(0.0),
                pi_s: Some(1.5),
            }),
            outgroup_tests: outgroups
                .iter()
                .map(|o| OutgroupTest {
                    outgroup: o.to_string(),
                    table: MkTable { pn: 1.0, ps: 2.0, dn: 3.0, ds: 4.0 },
                    neutrality_index: Some(0.5),
                })
                .collect(),
        })
    }

    fn render(table: &ReportTable) -> String {
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_without_frame() {
        let table = ReportTable::new(false, vec!["dsim".to_string()]);
        assert_eq!(table.header().join("\t"), "Alignment\tTheta\tPi\tTajimasD\tnseff");
    }

    #[test]
    fn test_header_with_outgroups() {
        let table = ReportTable::new(true, vec!["dsim".to_string(), "dyak".to_string()]);
        assert_eq!(
            table.header().join("\t"),
            "Alignment\tTheta\tPi\tTajimasD\tnseff\tPiN\tPiS\tMK_dsim\tNI_dsim\tMK_dyak\tNI_dyak"
        );
    }

    #[test]
    fn test_row_values() {
        let mut table = ReportTable::new(true, vec!["dsim".to_string()]);
        table.insert("geneA", stats(&["dsim"]));
        let text = render(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "geneA\t0.25\t0.5\tNA\t4\t0\t1.5\t1,2,3,4\t0.5");
    }

    #[test]
    fn test_column_count_is_fixed() {
        for frame in [false, true] {
            for n in 0..3 {
                let outgroups: Vec<String> = (0..n).map(|i| format!("out{}", i)).collect();
                let names: Vec<&str> = outgroups.iter().map(|s| s.as_str()).collect();
                let mut table = ReportTable::new(frame, outgroups.clone());
                table.insert("full", stats(&names));
                table.insert("partial", stats(&[]));
                table.insert(
                    "empty",
                    StatResult::Computed(AlignmentStats {
                        theta: None,
                        pi: None,
                        tajima_d: None,
                        nseff: None,
                        coding: None,
                        outgroup_tests: Vec::new(),
                    }),
                );

                let text = render(&table);
                let widths: Vec<usize> = text.lines().map(|l| l.split('\t').count()).collect();
                assert_eq!(widths.len(), 4);
                assert!(widths.iter().all(|&w| w == widths[0]), "{:?}", widths);
                let expected = if frame { 7 + 2 * n } else { 5 };
                assert_eq!(widths[0], expected);
            }
        }
    }

    #[test]
    fn test_out_of_frame_rows_are_skipped() {
        let mut table = ReportTable::new(true, Vec::new());
        table.insert("geneA", stats(&[]));
        table.insert("geneB", StatResult::OutOfFrame);
        table.insert("geneC", stats(&[]));

        assert_eq!(table.len(), 3);
        assert_eq!(table.rejected().collect::<Vec<_>>(), vec!["geneB"]);

        let mut out = Vec::new();
        assert_eq!(table.write_to(&mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let names: Vec<&str> = text.lines().skip(1).map(|l| l.split('\t').next().unwrap()).collect();
        assert_eq!(names, vec!["geneA", "geneC"]);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut table = ReportTable::new(false, Vec::new());
        table.insert("b", stats(&[]));
        table.insert("a", StatResult::OutOfFrame);
        table.insert("b", StatResult::OutOfFrame);
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(table.get("b"), Some(&StatResult::OutOfFrame));
    }

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_REPORT_NAME);
        std::fs::write(&path, "stale content\nmore\nlines\n").unwrap();

        let mut table = ReportTable::new(false, Vec::new());
        table.insert("geneA", stats(&[]));
        assert_eq!(table.write_file(&path).unwrap(), 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains("stale"));
    }
}
