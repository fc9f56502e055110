use crate::domain::{ExportError, LegalRecord};
use tracing::info;

pub struct LegalRecordExporter;

impl LegalRecordExporter {
    /// Writes `id,author,statement,attachments` rows; attachments are `;`-joined.
    ///
    /// Returns the filename written.
    pub fn export_to_csv(records: &[LegalRecord], filename: &str) -> Result<String, ExportError> {
        if records.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut writer = csv::Writer::from_path(filename)?;
        writer.write_record(["id", "author", "statement", "attachments"])?;

        for record in records {
            writer.write_record([
                record.id.to_string(),
                record.author.clone(),
                record.statement.clone(),
                record.attachments.join(";"),
            ])?;
        }

        writer.flush()?;
        info!(records = records.len(), filename, "exported legal records");
        Ok(filename.to_string())
    }
}
