use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::Utc;
use rand::Rng;
use tokio::fs;

use crate::error::HttpError;
use crate::models::messagemodel::Attachment;
use crate::models::projectmodel::FileRef;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_FILES_PER_REQUEST: usize = 10;

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
];

const DRAWING_TYPES: &[&str] = &[
    "application/pdf",
    "image/dwg",
    "application/acad",
    "application/dxf",
    "application/dwg",
];

/// Upload slots the API accepts, each with its own allow-list and cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadField {
    PropertyImages,
    Boq,
    Drawings,
    OtherDocuments,
    BidDocuments,
    MessageAttachment,
}

pub const PROJECT_FILE_FIELDS: &[UploadField] = &[
    UploadField::PropertyImages,
    UploadField::Boq,
    UploadField::Drawings,
    UploadField::OtherDocuments,
];

impl UploadField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "propertyImages" => Some(UploadField::PropertyImages),
            "boq" => Some(UploadField::Boq),
            "drawings" => Some(UploadField::Drawings),
            "otherDocuments" => Some(UploadField::OtherDocuments),
            "bidDocuments" => Some(UploadField::BidDocuments),
            "file" => Some(UploadField::MessageAttachment),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            UploadField::PropertyImages => "propertyImages",
            UploadField::Boq => "boq",
            UploadField::Drawings => "drawings",
            UploadField::OtherDocuments => "otherDocuments",
            UploadField::BidDocuments => "bidDocuments",
            UploadField::MessageAttachment => "file",
        }
    }

    pub fn subdir(&self) -> &'static str {
        match self {
            UploadField::PropertyImages => "property-images",
            UploadField::Boq => "boq",
            UploadField::Drawings => "drawings",
            UploadField::OtherDocuments => "documents",
            UploadField::BidDocuments => "bid-documents",
            UploadField::MessageAttachment => "attachments",
        }
    }

    pub fn max_count(&self) -> usize {
        match self {
            UploadField::PropertyImages => 10,
            UploadField::Boq => 5,
            UploadField::Drawings => 10,
            UploadField::OtherDocuments => 5,
            UploadField::BidDocuments => 5,
            UploadField::MessageAttachment => 1,
        }
    }

    pub fn allowed_types(&self) -> Vec<&'static str> {
        match self {
            UploadField::PropertyImages => IMAGE_TYPES.to_vec(),
            UploadField::Boq | UploadField::OtherDocuments | UploadField::BidDocuments => {
                DOCUMENT_TYPES.to_vec()
            }
            UploadField::Drawings => DRAWING_TYPES.to_vec(),
            UploadField::MessageAttachment => {
                let mut types = IMAGE_TYPES.to_vec();
                types.extend_from_slice(DOCUMENT_TYPES);
                types
            }
        }
    }

    pub fn allows(&self, mime_type: &str) -> bool {
        self.allowed_types().contains(&mime_type)
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: String,
}

impl StoredFile {
    pub fn to_file_ref(&self) -> FileRef {
        FileRef {
            filename: self.filename.clone(),
            original_name: self.original_name.clone(),
            path: self.path.clone(),
            uploaded_at: Utc::now(),
        }
    }

    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            filename: self.filename.clone(),
            original_name: self.original_name.clone(),
            path: self.path.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
        }
    }
}

/// The file intake boundary. Uploads are validated and written to disk
/// before any entity row is touched, so a rejected upload never leaves a
/// half-committed mutation behind.
#[derive(Debug, Clone)]
pub struct FileIntake {
    upload_dir: String,
}

impl FileIntake {
    pub fn new(upload_dir: impl Into<String>) -> Self {
        FileIntake {
            upload_dir: upload_dir.into(),
        }
    }

    /// Pure admission check for a single incoming file.
    pub fn check(
        &self,
        field: UploadField,
        mime_type: &str,
        size: usize,
        stored_in_field: usize,
        stored_total: usize,
    ) -> Result<(), HttpError> {
        if !field.allows(mime_type) {
            return Err(HttpError::bad_request(format!(
                "Invalid file type for {}. Allowed types: {}",
                field.field_name(),
                field.allowed_types().join(", ")
            )));
        }

        if size > MAX_FILE_SIZE {
            return Err(HttpError::bad_request(
                "File too large. Maximum size is 10MB.",
            ));
        }

        if stored_total >= MAX_FILES_PER_REQUEST {
            return Err(HttpError::bad_request(
                "Too many files. Maximum is 10 files.",
            ));
        }

        if stored_in_field >= field.max_count() {
            return Err(HttpError::bad_request(format!(
                "Too many files for {}. Maximum is {}.",
                field.field_name(),
                field.max_count()
            )));
        }

        Ok(())
    }

    pub async fn store(
        &self,
        field: UploadField,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<StoredFile, HttpError> {
        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let unique_suffix = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            rand::rng().random_range(0..1_000_000_000u32)
        );
        let filename = format!("{}-{}{}", field.field_name(), unique_suffix, extension);

        let dir = format!("{}/{}", self.upload_dir, field.subdir());
        fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory {}: {}", dir, e);
            HttpError::server_error("Failed to store uploaded file")
        })?;

        let path = format!("{}/{}", dir, filename);
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write upload {}: {}", path, e);
            HttpError::server_error("Failed to store uploaded file")
        })?;

        Ok(StoredFile {
            filename,
            original_name: original_name.to_string(),
            path,
            size: data.len() as i64,
            mime_type: mime_type.to_string(),
        })
    }

    /// Drains a multipart request into text fields plus stored files,
    /// enforcing the per-field allow-lists and counts as it goes.
    pub async fn collect(
        &self,
        multipart: &mut Multipart,
        allowed: &[UploadField],
    ) -> Result<(Vec<(String, String)>, HashMap<UploadField, Vec<StoredFile>>), HttpError> {
        let mut text_fields: Vec<(String, String)> = Vec::new();
        let mut files: HashMap<UploadField, Vec<StoredFile>> = HashMap::new();
        let mut total_files = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HttpError::bad_request(format!("Invalid multipart request: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let upload_field = UploadField::from_name(&name)
                .filter(|f| allowed.contains(f) && field.file_name().is_some());

            match upload_field {
                Some(upload_field) => {
                    let original_name = field
                        .file_name()
                        .unwrap_or("upload")
                        .to_string();
                    let mime_type = field.content_type().unwrap_or_default().to_string();

                    let data = field.bytes().await.map_err(|e| {
                        HttpError::bad_request(format!("Failed to read uploaded file: {}", e))
                    })?;

                    let stored_in_field = files.get(&upload_field).map_or(0, |v| v.len());
                    self.check(
                        upload_field,
                        &mime_type,
                        data.len(),
                        stored_in_field,
                        total_files,
                    )?;

                    let stored = self
                        .store(upload_field, &original_name, &mime_type, &data)
                        .await?;

                    files.entry(upload_field).or_default().push(stored);
                    total_files += 1;
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        HttpError::bad_request(format!("Invalid form field {}: {}", name, e))
                    })?;
                    text_fields.push((name, value));
                }
            }
        }

        Ok((text_fields, files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_images_accept_images_only() {
        let intake = FileIntake::new("uploads");

        assert!(intake
            .check(UploadField::PropertyImages, "image/png", 1024, 0, 0)
            .is_ok());
        assert!(intake
            .check(UploadField::PropertyImages, "application/pdf", 1024, 0, 0)
            .is_err());
    }

    #[test]
    fn drawings_accept_cad_formats() {
        let field = UploadField::Drawings;
        assert!(field.allows("application/dxf"));
        assert!(field.allows("application/pdf"));
        assert!(!field.allows("image/png"));
    }

    #[test]
    fn bid_documents_follow_the_document_allow_list() {
        let field = UploadField::BidDocuments;
        assert!(field.allows("application/pdf"));
        assert!(field.allows("text/plain"));
        assert!(!field.allows("application/dxf"));
    }

    #[test]
    fn oversized_files_are_rejected() {
        let intake = FileIntake::new("uploads");
        let result = intake.check(
            UploadField::Boq,
            "application/pdf",
            MAX_FILE_SIZE + 1,
            0,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn per_field_count_limit_applies() {
        let intake = FileIntake::new("uploads");
        let result = intake.check(UploadField::Boq, "application/pdf", 1024, 5, 5);
        assert!(result.is_err());
    }

    #[test]
    fn request_wide_count_limit_applies() {
        let intake = FileIntake::new("uploads");
        let result = intake.check(
            UploadField::PropertyImages,
            "image/png",
            1024,
            4,
            MAX_FILES_PER_REQUEST,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_names_are_not_upload_slots() {
        assert_eq!(UploadField::from_name("avatar"), None);
        assert_eq!(
            UploadField::from_name("bidDocuments"),
            Some(UploadField::BidDocuments)
        );
    }
}
