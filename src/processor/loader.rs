use std::{fs::File, path::Path};

use log::debug;
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;

use crate::processor::{
    ProcessorError,
    column::{Column, ColumnType},
    table::Table,
};

/// Rows sampled from the top of the file to infer column types.
const SCHEMA_SAMPLE_ROWS: usize = 100;

/// Anything that turns a path into a [`Table`].
pub trait TableSource {
    /// # Errors
    /// Every failure is reported as [`ProcessorError::Load`] carrying the
    /// underlying cause.
    fn load(&self, path: &Path) -> Result<Table, ProcessorError>;
}

/// Low-level CSV problems, reported as the source of a [`ProcessorError::Load`].
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("missing header line")]
    MissingHeader,

    #[error("line {line}: expected {expected} fields, got {got}")]
    FieldCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("line {line}, column '{column}': cannot parse '{value}' as {expected}")]
    BadValue {
        line: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
}

/// Memory-mapped CSV reader.
///
/// The header names the columns. Column types are inferred from the first
/// rows (int, then float, else string). An int column that meets a float
/// further down becomes a float column; any other misfit is an error.
/// Lines are split on the delimiter only; quoting is not supported.
///
/// # Example
///
/// ```rust,no_run
/// use groupby_engine::processor::loader::{CsvSource, TableSource};
///
/// let table = CsvSource::new().load("data/sales.csv".as_ref()).unwrap();
/// println!("{table}");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CsvSource {
    delimiter: u8,
}

struct BatchResult {
    columns: Vec<Column>,
    row_count: usize,
}

impl CsvSource {
    pub fn new() -> Self {
        CsvSource { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn read(&self, path: &Path) -> Result<Table, Box<dyn std::error::Error + Send + Sync>> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = memchr::memchr(b'\n', buf).unwrap_or(buf.len());
        let header_line = trim_cr(&buf[..header_end]);
        if header_line.is_empty() {
            return Err(CsvError::MissingHeader.into());
        }
        let headers: Vec<String> = header_line
            .split(|&b| b == self.delimiter)
            .map(|s| String::from_utf8_lossy(s).trim().to_string())
            .collect();

        let data = if header_end < buf.len() {
            &buf[header_end + 1..]
        } else {
            &[][..]
        };

        let schema = self.infer_schema(data, headers.len())?;

        // Find chunk boundaries (split by newlines)
        let num_threads = rayon::current_num_threads();
        let chunks = find_chunk_boundaries(data, num_threads);

        // Absolute line number of each chunk's first line (header is line 1)
        let mut first_lines = Vec::with_capacity(chunks.len());
        let mut line = 2;
        for (start, end) in &chunks {
            first_lines.push(line);
            line += memchr_iter(b'\n', &data[*start..*end]).count();
        }

        // Parse chunks in parallel
        let batch_results = chunks
            .par_iter()
            .enumerate()
            .map(|(chunk_idx, (start, end))| {
                self.parse_chunk(&data[*start..*end], &schema, &headers, first_lines[chunk_idx])
            })
            .collect::<Result<Vec<BatchResult>, CsvError>>()?;

        // Merge batch results, in file order
        let mut columns: Vec<Column> = schema.iter().map(|t| Column::empty(*t)).collect();
        let mut total_rows = 0;
        for batch in batch_results {
            total_rows += batch.row_count;
            for (col, part) in columns.iter_mut().zip(batch.columns) {
                col.append(part)?;
            }
        }

        debug!(
            "loaded {} rows x {} columns from {} in {} chunks",
            total_rows,
            headers.len(),
            path.display(),
            chunks.len()
        );

        Ok(Table::from_columns(headers.into_iter().zip(columns))?)
    }

    fn infer_schema(&self, data: &[u8], num_cols: usize) -> Result<Vec<ColumnType>, CsvError> {
        let mut schema: Vec<Option<ColumnType>> = vec![None; num_cols];

        for (idx, line) in data
            .split(|&b| b == b'\n')
            .map(trim_cr)
            .enumerate()
            .filter(|(_, l)| !l.is_empty())
            .take(SCHEMA_SAMPLE_ROWS)
        {
            let fields: Vec<&[u8]> = line.split(|&b| b == self.delimiter).collect();
            if fields.len() != num_cols {
                return Err(CsvError::FieldCount {
                    line: idx + 2,
                    expected: num_cols,
                    got: fields.len(),
                });
            }
            for (slot, field) in schema.iter_mut().zip(fields) {
                let seen = sniff_type(field);
                *slot = Some(match (*slot, seen) {
                    (None, t) => t,
                    (Some(ColumnType::Str), _) | (_, ColumnType::Str) => ColumnType::Str,
                    (Some(ColumnType::Float64), _) | (_, ColumnType::Float64) => {
                        ColumnType::Float64
                    }
                    _ => ColumnType::Int64,
                });
            }
        }

        Ok(schema
            .into_iter()
            .map(|t| t.unwrap_or(ColumnType::Str))
            .collect())
    }

    fn parse_chunk(
        &self,
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        first_line: usize,
    ) -> Result<BatchResult, CsvError> {
        let num_cols = schema.len();
        let mut columns: Vec<Column> = schema.iter().map(|t| Column::empty(*t)).collect();
        let mut row_count = 0;
        let mut fields: Vec<&[u8]> = Vec::with_capacity(num_cols);

        // Iterate lines, including a final line without a trailing newline
        let mut start = 0;
        let ends = memchr_iter(b'\n', chunk).chain(std::iter::once(chunk.len()));
        for (line_idx, line_end) in ends.enumerate() {
            let line = trim_cr(&chunk[start..line_end]);
            start = line_end + 1;

            if line.is_empty() {
                continue;
            }
            let line_no = first_line + line_idx;

            // Split line into fields
            fields.clear();
            let mut field_start = 0;
            for pos in memchr_iter(self.delimiter, line) {
                fields.push(&line[field_start..pos]);
                field_start = pos + 1;
            }
            fields.push(&line[field_start..]);

            if fields.len() != num_cols {
                return Err(CsvError::FieldCount {
                    line: line_no,
                    expected: num_cols,
                    got: fields.len(),
                });
            }

            // Parse each field according to schema
            for (col_idx, column) in columns.iter_mut().enumerate() {
                let field = fields[col_idx];
                let bad_value = |expected: &'static str| CsvError::BadValue {
                    line: line_no,
                    column: headers[col_idx].clone(),
                    value: String::from_utf8_lossy(field).to_string(),
                    expected,
                };
                match column {
                    Column::Int64(values) => match atoi_simd::parse::<i64>(field) {
                        Ok(v) => values.push(v),
                        // A float past the sampled rows turns the column into floats
                        Err(_) => {
                            let v = fast_float::parse::<f64, _>(field)
                                .map_err(|_| bad_value("number"))?;
                            column.widen_to_float();
                            if let Column::Float64(values) = column {
                                values.push(v);
                            }
                        }
                    },
                    Column::Float64(values) => values.push(
                        fast_float::parse::<f64, _>(field).map_err(|_| bad_value("number"))?,
                    ),
                    Column::Str(values) => values.push(String::from_utf8_lossy(field).to_string()),
                }
            }

            row_count += 1;
        }

        Ok(BatchResult { columns, row_count })
    }
}

impl Default for CsvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSource for CsvSource {
    fn load(&self, path: &Path) -> Result<Table, ProcessorError> {
        self.read(path).map_err(|source| ProcessorError::Load {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads a comma-separated file with [`CsvSource`].
pub fn load_csv(path: &Path) -> Result<Table, ProcessorError> {
    CsvSource::new().load(path)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn sniff_type(field: &[u8]) -> ColumnType {
    if atoi_simd::parse::<i64>(field).is_ok() {
        ColumnType::Int64
    } else if fast_float::parse::<f64, _>(field).is_ok() {
        ColumnType::Float64
    } else {
        ColumnType::Str
    }
}

/// Splits `data` into up to `num_chunks` ranges, each ending just after a
/// newline (the last one may end at end of input).
fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return vec![];
    }

    let chunk_size = data.len() / num_chunks.max(1);
    let mut boundaries = Vec::with_capacity(num_chunks);
    let mut start = 0;

    for i in 0..num_chunks.saturating_sub(1) {
        let mut end = ((i + 1) * chunk_size).max(start);

        // Find next newline
        end = match memchr::memchr(b'\n', &data[end..]) {
            Some(offset) => end + offset + 1,
            None => data.len(),
        };

        if start < end {
            boundaries.push((start, end));
        }
        start = end;
    }

    // Last chunk gets everything remaining
    if start < data.len() {
        boundaries.push((start, data.len()));
    }

    boundaries
}
