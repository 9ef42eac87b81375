//! CSV rendering and file-download responses.

use crate::error::ApiError;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::HttpResponse;
use common::model::export::ExportFormat;

/// Renders `rows` under `header` as CSV bytes.
pub fn to_csv(header: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| ApiError::Internal(format!("csv write failed: {}", e)))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| ApiError::Internal(format!("csv write failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("csv flush failed: {}", e)))
}

/// `200` carrying `bytes` as a file named `filename`.
pub fn attachment(bytes: Vec<u8>, filename: &str, format: ExportFormat) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_that_need_it() {
        let bytes = to_csv(
            &["name", "note"],
            &[vec!["Acme".into(), "a, b".into()]],
        )
        .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "name,note\nAcme,\"a, b\"\n");
    }
}
