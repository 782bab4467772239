/// CSV import and export for tables
///
/// CSV files carry no type information, so import always takes an explicit
/// schema:
/// ```csv
/// 1,2,F,M,friend
/// 1,3,F,M,follower
/// ```
/// with schema `src:str,dst:str,src_type:str,dst_type:str,edge_type:str`.

use super::{Schema, Table, TableError, TableResult, Value};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// CSV reading/writing options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// First record is a header row
    pub header: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            header: false,
            delimiter: b',',
        }
    }
}

impl Table {
    /// Import a CSV file with an explicit schema
    pub fn import_csv<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        options: &CsvOptions,
    ) -> TableResult<Table> {
        let file = File::open(path)?;
        Self::read_csv(BufReader::new(file), schema, options)
    }

    /// Read CSV records from any reader
    ///
    /// With `header` set, the header row is skipped; columns are always taken
    /// positionally from the schema.
    pub fn read_csv<R: Read>(reader: R, schema: Schema, options: &CsvOptions) -> TableResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(options.header)
            .delimiter(options.delimiter)
            .from_reader(reader);

        let mut table = Table::new(schema);
        for (row_num, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != table.schema().len() {
                return Err(TableError::Arity {
                    row: row_num,
                    expected: table.schema().len(),
                    actual: record.len(),
                });
            }

            let mut row = Vec::with_capacity(record.len());
            for (field, column) in record.iter().zip(table.schema().columns()) {
                let value = Value::parse(field, column.dtype).ok_or_else(|| TableError::Parse {
                    row: row_num,
                    column: column.name.clone(),
                    value: field.to_string(),
                    dtype: column.dtype,
                })?;
                row.push(value);
            }
            table.push_row(row)?;
        }

        Ok(table)
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W, options: &CsvOptions) -> TableResult<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(writer);

        if options.header {
            csv_writer.write_record(self.schema().names())?;
        }
        for row in self.rows() {
            csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file
    pub fn export_csv<P: AsRef<Path>>(&self, path: P, options: &CsvOptions) -> TableResult<()> {
        let file = File::create(path)?;
        self.write_csv(file, options)
    }
}
