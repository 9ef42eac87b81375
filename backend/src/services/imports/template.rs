use crate::error::ApiError;
use crate::export::{attachment, to_csv};
use actix_web::{web, HttpResponse};
use common::model::export::ExportFormat;
use common::model::import::ImportEntityType;
use common::validation::ValidationFailure;

/// Empty sheet carrying the header row an import of this entity expects.
pub(crate) async fn process(entity_type: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let entity: ImportEntityType = entity_type
        .parse()
        .map_err(|e: String| ValidationFailure::single("entity_type", e))?;
    let header: Vec<&str> = entity.columns().iter().map(|c| c.name).collect();
    let bytes = to_csv(&header, &[])?;
    let filename = format!("{}-template.csv", entity.as_str());
    Ok(attachment(bytes, &filename, ExportFormat::Csv))
}
