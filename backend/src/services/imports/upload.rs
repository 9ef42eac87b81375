use super::pipeline::{self, map_columns, sheet_headers};
use crate::error::ApiError;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use chrono::Utc;
use common::model::import::{ImportAccepted, ImportJob, ImportJobState};
use common::requests::ImportUploadMeta;
use common::validation::{check, ValidationFailure};
use futures_util::StreamExt;
use log::{info, warn};
use md5::Context;
use rusqlite::params;
use uuid::Uuid;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A `file` part that has been read to the end.
struct UploadedFile {
    name: String,
    data: Vec<u8>,
    checksum: String,
}

fn check_file_name(name: &str) -> Result<(), ApiError> {
    let lower = name.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        return Err(ApiError::BadRequest(
            "Excel workbooks are not accepted; save the sheet as CSV and upload that file".into(),
        ));
    }
    if !lower.ends_with(".csv") {
        return Err(ApiError::BadRequest("the file must end with .csv".into()));
    }
    Ok(())
}

async fn read_parts(mut payload: Multipart) -> Result<(ImportUploadMeta, UploadedFile), ApiError> {
    let mut meta: Option<ImportUploadMeta> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("meta") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
                    bytes.extend_from_slice(&chunk);
                }
                let parsed: ImportUploadMeta = serde_json::from_slice(&bytes)
                    .map_err(|e| ValidationFailure::single("meta", e.to_string()))?;
                check(&parsed)?;
                meta = Some(parsed);
            }
            Some("file") => {
                if meta.is_none() {
                    return Err(ApiError::BadRequest("meta must be sent before the file".into()));
                }
                let name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                check_file_name(&name)?;

                let mut hasher = Context::new();
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
                    if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                        return Err(ApiError::BadRequest("the file exceeds 10 MB".into()));
                    }
                    hasher.consume(&chunk);
                    data.extend_from_slice(&chunk);
                }
                file = Some(UploadedFile {
                    name,
                    data,
                    checksum: format!("{:x}", hasher.finalize()),
                });
            }
            _ => {}
        }
    }

    let meta = meta.ok_or_else(|| ValidationFailure::single("meta", "meta is required"))?;
    let file = file.ok_or_else(|| ValidationFailure::single("file", "file is required"))?;
    Ok((meta, file))
}

pub(crate) async fn process(
    payload: Multipart,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (meta, file) = read_parts(payload).await?;
    let entity = meta.entity_type;

    let headers =
        sheet_headers(&file.data).map_err(|e| ValidationFailure::single("file", e.to_string()))?;
    if let Err(e) = map_columns(entity, &headers) {
        warn!("Rejected {} import '{}': {}", entity.as_str(), file.name, e);
        return Err(ValidationFailure::single("file", e.to_string()).into());
    }

    let object_path = format!("{}/{}.csv", entity.as_str(), file.checksum);
    state
        .store
        .upload(
            &state.import_bucket,
            &object_path,
            Bytes::from(file.data),
            "text/csv",
        )
        .await?;

    let job = ImportJob {
        id: Uuid::new_v4(),
        entity_type: entity,
        file_name: file.name,
        object_path,
        checksum: file.checksum,
        state: ImportJobState::Pending,
        total_rows: 0,
        imported_rows: 0,
        error_count: 0,
        created_at: Utc::now(),
        finished_at: None,
    };
    let record = job.clone();
    state
        .db
        .run(move |conn| {
            conn.execute(
                "INSERT INTO import_jobs (id, entity_type, file_name, object_path, checksum, state, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.entity_type.as_str(),
                    record.file_name,
                    record.object_path,
                    record.checksum,
                    record.state.as_str(),
                    record.created_at
                ],
            )?;
            Ok(())
        })
        .await?;

    state.jobs.register(job.id).await;
    info!(
        "Scheduled import {} of {} from '{}'",
        job.id,
        entity.as_str(),
        job.file_name
    );

    let job_id = job.id;
    tokio::spawn(pipeline::run(
        state.db.clone(),
        state.store.clone(),
        state.import_bucket.clone(),
        job,
        state.jobs.tx.clone(),
    ));

    Ok(HttpResponse::Accepted().json(ImportAccepted { job_id }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::multipart;
    use crate::state::testing::test_app;
    use actix_web::{test, web, App};
    use common::jobs::JobStatus;
    use common::model::import::{ImportAccepted, ImportJob, ImportJobState};
    use common::model::pagination::Page;
    use common::validation::ValidationFailure;
    use std::time::Duration;

    const META: &str = r#"{"entityType":"clients"}"#;

    #[actix_web::test]
    async fn upload_runs_the_import_to_completion() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;

        let csv = "Name;Email\nAcme;contact@acme.test\nBolt;broken\nCogs;\n";
        let (content_type, body) =
            multipart(&[("meta", None, META), ("file", Some("clients.csv"), csv)]);
        let req = test::TestRequest::post()
            .uri("/api/imports/upload")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 202);
        let accepted: ImportAccepted = test::read_body_json(resp).await;

        let mut finished = None;
        for _ in 0..200 {
            let req = test::TestRequest::get()
                .uri(&format!("/api/imports/status/{}", accepted.job_id))
                .to_request();
            let status: JobStatus = test::call_and_read_body_json(&app, req).await;
            if status.is_finished() {
                finished = Some(status);
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(20)).await;
        }
        match finished {
            Some(JobStatus::Completed(report)) => {
                assert_eq!(report.total_rows, 3);
                assert_eq!(report.imported_rows, 2);
                assert_eq!(report.errors.len(), 1);
                assert_eq!(report.errors[0].row, 3);
                assert_eq!(report.errors[0].column.as_deref(), Some("email"));
            }
            other => panic!("import did not complete: {:?}", other),
        }
        // the stored outcome replaces the live entry
        assert_eq!(t.state.jobs.status(&accepted.job_id).await, None);

        let req = test::TestRequest::get().uri("/api/imports/recent").to_request();
        let page: Page<ImportJob> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.total, 1);
        let job = &page.items[0];
        assert_eq!(job.state, ImportJobState::CompletedWithErrors);
        assert_eq!(job.object_path, format!("clients/{}.csv", job.checksum));
        assert_eq!(job.error_count, 1);

        let stored = t
            .state
            .store
            .download("imports", &job.object_path)
            .await
            .unwrap();
        assert_eq!(&stored[..], csv.as_bytes());
    }

    #[actix_web::test]
    async fn upload_rejections() {
        let t = test_app().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;
        let send = |parts: &[(&str, Option<&str>, &str)]| {
            let (content_type, body) = multipart(parts);
            test::TestRequest::post()
                .uri("/api/imports/upload")
                .insert_header(("content-type", content_type))
                .set_payload(body)
                .to_request()
        };

        // file before meta
        let req = send(&[("file", Some("c.csv"), "name\nA\n"), ("meta", None, META)]);
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        // workbook
        let req = send(&[("meta", None, META), ("file", Some("c.xlsx"), "PK")]);
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        // unknown entity
        let req = send(&[
            ("meta", None, r#"{"entityType":"invoices"}"#),
            ("file", Some("c.csv"), "name\nA\n"),
        ]);
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("meta"));

        // header without the required column
        let req = send(&[("meta", None, META), ("file", Some("c.csv"), "email\na@b.test\n")]);
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let failure: ValidationFailure = test::read_body_json(resp).await;
        assert!(failure.has_field("file"));

        let count: i64 = t
            .state
            .db
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM import_jobs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
